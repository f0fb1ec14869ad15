//! Artifact models handed to gates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::status::ArtifactKind;

/// Whitespace-delimited word count, the measure every gate agrees on.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Generated script document as produced upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: ScriptMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptArtifact {
    pub id: String,
    pub path: PathBuf,
    pub document: ScriptDocument,
    /// Untyped form of the document, validated structurally by the schema gate.
    pub raw: Value,
}

impl ScriptArtifact {
    /// Build a script artifact from a raw JSON value. Fields that do not fit
    /// the typed model fall back to defaults; the schema gate reports them.
    pub fn from_value(id: impl Into<String>, path: impl Into<PathBuf>, raw: Value) -> Self {
        let document = serde_json::from_value::<ScriptDocument>(raw.clone()).unwrap_or_else(|_| {
            ScriptDocument {
                topic: raw
                    .get("topic")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content: raw
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                ..ScriptDocument::default()
            }
        });
        Self {
            id: id.into(),
            path: path.into(),
            document,
            raw,
        }
    }

    pub fn from_document(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        document: ScriptDocument,
    ) -> Self {
        let raw = serde_json::to_value(&document).unwrap_or(Value::Null);
        Self {
            id: id.into(),
            path: path.into(),
            document,
            raw,
        }
    }

    pub fn content(&self) -> &str {
        &self.document.content
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.document.content)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub id: String,
    pub path: PathBuf,
    /// Id of the script this narration was synthesized from.
    pub script_id: Option<String>,
    /// Word count of the originating script, supplied by the caller.
    pub expected_word_count: Option<u64>,
}

impl AudioArtifact {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            script_id: None,
            expected_word_count: None,
        }
    }

    pub fn with_script(mut self, script_id: impl Into<String>) -> Self {
        self.script_id = Some(script_id.into());
        self
    }

    pub fn with_expected_word_count(mut self, words: u64) -> Self {
        self.expected_word_count = Some(words);
        self
    }
}

/// Any artifact a gate may be asked to check.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Script(ScriptArtifact),
    Audio(AudioArtifact),
}

impl Artifact {
    pub fn id(&self) -> &str {
        match self {
            Self::Script(s) => &s.id,
            Self::Audio(a) => &a.id,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Script(s) => &s.path,
            Self::Audio(a) => &a.path,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Script(_) => ArtifactKind::Script,
            Self::Audio(_) => ArtifactKind::Audio,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptArtifact> {
        match self {
            Self::Script(s) => Some(s),
            Self::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioArtifact> {
        match self {
            Self::Audio(a) => Some(a),
            Self::Script(_) => None,
        }
    }
}

impl From<ScriptArtifact> for Artifact {
    fn from(s: ScriptArtifact) -> Self {
        Self::Script(s)
    }
}

impl From<AudioArtifact> for Artifact {
    fn from(a: AudioArtifact) -> Self {
        Self::Audio(a)
    }
}
