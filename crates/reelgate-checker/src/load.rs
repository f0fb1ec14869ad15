//! Turning files on disk into artifacts.

use std::path::{Path, PathBuf};

use serde_json::Value;

use reelgate_core::errors::ArtifactError;
use reelgate_core::time;
use reelgate_core::types::{word_count, ScriptArtifact, ScriptDocument, ScriptMetadata};

const UNKNOWN_TOPIC: &str = "Unknown";

/// Artifact id of a file: its stem.
pub fn artifact_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `script_<n>_<topic>` → `<topic>`.
pub fn topic_from_stem(stem: &str) -> String {
    let mut parts = stem.splitn(3, '_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(topic)) if !topic.is_empty() => topic.to_string(),
        _ => UNKNOWN_TOPIC.to_string(),
    }
}

/// Script a narration belongs to: the audio stem without its `_audio` /
/// `audio_` marker.
pub fn script_id_for_audio(audio_stem: &str) -> String {
    audio_stem
        .strip_suffix("_audio")
        .or_else(|| audio_stem.strip_prefix("audio_"))
        .unwrap_or(audio_stem)
        .to_string()
}

/// Load a script, preferring `<id>.json` next to `path` and falling back to
/// wrapping `<id>.txt`.
pub fn load_script(path: &Path) -> Result<ScriptArtifact, ArtifactError> {
    let id = artifact_id(path);
    let json_path = path.with_extension("json");
    let txt_path = path.with_extension("txt");

    let json_err = if json_path.is_file() {
        match read_json(&json_path) {
            Ok(raw) => return Ok(ScriptArtifact::from_value(id, json_path, raw)),
            Err(e) => {
                tracing::warn!(path = %json_path.display(), error = %e, "unreadable script JSON; trying .txt");
                Some(e)
            }
        }
    } else {
        None
    };

    if txt_path.is_file() {
        let content = std::fs::read_to_string(&txt_path).map_err(|source| ArtifactError::Io {
            path: txt_path.clone(),
            source,
        })?;
        let document = ScriptDocument {
            topic: topic_from_stem(&id),
            metadata: ScriptMetadata {
                model: Some("unknown".to_string()),
                timestamp: Some(time::now_rfc3339()),
                word_count: Some(word_count(&content) as u64),
                duration_seconds: Some(0.0),
                ..ScriptMetadata::default()
            },
            content,
            ..ScriptDocument::default()
        };
        return Ok(ScriptArtifact::from_document(id, txt_path, document));
    }

    Err(json_err.unwrap_or(ArtifactError::NotFound {
        path: path.to_path_buf(),
    }))
}

fn read_json(path: &Path) -> Result<Value, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| ArtifactError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ArtifactError::Malformed {
            path: path.to_path_buf(),
            message: "script document must be a JSON object".to_string(),
        })
    }
}

/// Script files in `dir`, one per stem, `.json` preferred over `.txt`.
pub fn discover_scripts(dir: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
    let mut by_stem = std::collections::BTreeMap::new();
    for path in read_dir(dir)? {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if ext != "json" && ext != "txt" {
            continue;
        }
        let stem = artifact_id(&path);
        let slot = by_stem.entry(stem).or_insert_with(|| path.clone());
        if ext == "json" {
            *slot = path;
        }
    }
    Ok(by_stem.into_values().collect())
}

/// `*.wav` files in `dir`, sorted.
pub fn discover_audio(dir: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
    Ok(read_dir(dir)?
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect())
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_and_script_id() {
        assert_eq!(topic_from_stem("script_001_buracos_negros"), "buracos_negros");
        assert_eq!(topic_from_stem("script_001"), "Unknown");
        assert_eq!(script_id_for_audio("script_001_gatos_audio"), "script_001_gatos");
        assert_eq!(script_id_for_audio("audio_script_002"), "script_002");
        assert_eq!(script_id_for_audio("script_003"), "script_003");
    }

    #[test]
    fn txt_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("script_007_oceanos.txt");
        std::fs::write(&txt, "O oceano cobre boa parte do planeta.").unwrap();
        let script = load_script(&txt).unwrap();
        assert_eq!(script.id, "script_007_oceanos");
        assert_eq!(script.document.topic, "oceanos");
        assert_eq!(script.document.metadata.word_count, Some(7));
        assert_eq!(script.raw["metadata"]["model"], "unknown");
    }

    #[test]
    fn json_preferred_and_broken_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("script_001_x.txt");
        let json = dir.path().join("script_001_x.json");
        std::fs::write(&txt, "texto do arquivo").unwrap();
        std::fs::write(&json, r#"{"topic": "t", "content": "texto do json"}"#).unwrap();
        assert_eq!(load_script(&txt).unwrap().content(), "texto do json");

        std::fs::write(&json, "{ not json").unwrap();
        assert_eq!(load_script(&json).unwrap().content(), "texto do arquivo");

        std::fs::remove_file(&txt).unwrap();
        assert!(matches!(load_script(&json), Err(ArtifactError::Malformed { .. })));
        assert!(matches!(
            load_script(&dir.path().join("nope.txt")),
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn discovery_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "a.json", "b.txt", "c.wav", "notes.md"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let scripts = discover_scripts(dir.path()).unwrap();
        assert_eq!(scripts, vec![dir.path().join("a.json"), dir.path().join("b.txt")]);
        assert_eq!(discover_audio(dir.path()).unwrap(), vec![dir.path().join("c.wav")]);
    }
}
