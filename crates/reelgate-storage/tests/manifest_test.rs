//! Run manifest persistence, indirection and concurrency.

use std::fs;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use reelgate_storage::{
    AudioEntry, EntryStatus, ManifestDocument, ManifestLocation, QualityDetails, RunManifest,
    ScriptEntry,
};

fn script(id: &str, status: EntryStatus) -> ScriptEntry {
    ScriptEntry {
        script_id: id.to_string(),
        topic: "curiosidades".to_string(),
        path: format!("/scripts/{id}.json"),
        quality_status: status,
        ready_for_audio: matches!(status, EntryStatus::Pass | EntryStatus::Warn),
        word_count: Some(120),
        timestamp: Utc::now(),
        quality_details: QualityDetails::default(),
    }
}

fn audio(id: &str, status: EntryStatus) -> AudioEntry {
    AudioEntry {
        audio_id: id.to_string(),
        script_id: Some("script_001".to_string()),
        path: format!("/audio/{id}.wav"),
        quality_status: status,
        duration: Some(42.0),
        timestamp: Utc::now(),
        quality_details: QualityDetails::from_error("decoder missing"),
    }
}

fn read_disk(path: &std::path::Path) -> ManifestDocument {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn creates_per_run_file_behind_logical_path() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let manifest = RunManifest::open(&logical).unwrap();

    let run_id = manifest.run_id();
    assert!(run_id.starts_with("run_"));
    assert_eq!(
        manifest.physical_path(),
        dir.path().join("manifests").join(format!("{run_id}.json"))
    );
    assert!(logical.exists());
    assert_eq!(read_disk(&logical).run_id, run_id);
}

#[cfg(unix)]
#[test]
fn logical_path_is_a_symlink_on_unix() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let _manifest = RunManifest::open(&logical).unwrap();
    assert!(fs::symlink_metadata(&logical).unwrap().file_type().is_symlink());
}

#[test]
fn reopen_resolves_same_run() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let first = RunManifest::open(&logical).unwrap();
    first.add_script(script("script_001", EntryStatus::Pass)).unwrap();

    let second = RunManifest::open(&logical).unwrap();
    assert_eq!(second.run_id(), first.run_id());
    assert!(second.get_script("script_001").is_some());
}

#[test]
fn corrupt_manifest_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    fs::write(&logical, "{ this is not json").unwrap();

    let manifest = RunManifest::open(&logical).unwrap();
    assert!(manifest.snapshot().scripts.is_empty());
    assert_eq!(read_disk(&logical).run_id, manifest.run_id());
}

#[test]
fn copy_fallback_logical_file_is_followed() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let manifest = RunManifest::open(&logical).unwrap();
    manifest.add_script(script("script_001", EntryStatus::Pass)).unwrap();
    let physical = manifest.physical_path().to_path_buf();
    drop(manifest);

    // Replace the link with a plain copy, as on a file system without symlinks.
    let bytes = fs::read(&physical).unwrap();
    fs::remove_file(&logical).unwrap();
    fs::write(&logical, &bytes).unwrap();

    let reopened = RunManifest::open(&logical).unwrap();
    assert_eq!(reopened.physical_path(), physical);
    reopened.add_script(script("script_002", EntryStatus::Fail)).unwrap();
    // The copy is refreshed after each write.
    assert_eq!(read_disk(&logical).scripts.len(), 2);
}

#[test]
fn upsert_overwrites_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = RunManifest::open(dir.path().join("run_manifest.json")).unwrap();
    manifest.add_script(script("script_001", EntryStatus::Fail)).unwrap();
    manifest.add_script(script("script_001", EntryStatus::Pass)).unwrap();
    manifest.add_audio(audio("audio_001", EntryStatus::Fail)).unwrap();
    manifest.add_audio(audio("audio_001", EntryStatus::Error)).unwrap();

    let doc = manifest.snapshot();
    assert_eq!(doc.scripts.len(), 1);
    assert_eq!(doc.scripts[0].quality_status, EntryStatus::Pass);
    assert_eq!(doc.audio.len(), 1);
    assert_eq!(manifest.get_audio("audio_001").unwrap().quality_status, EntryStatus::Error);
}

#[test]
fn updated_at_strictly_advances() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = RunManifest::open(dir.path().join("run_manifest.json")).unwrap();
    let mut last = manifest.snapshot().updated_at;
    for i in 0..20 {
        manifest.add_script(script(&format!("s{i}"), EntryStatus::Pass)).unwrap();
        let now = manifest.snapshot().updated_at;
        assert!(now > last);
        last = now;
    }
    assert!(manifest.snapshot().created_at < last);
}

#[test]
fn failure_and_readiness_queries() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = RunManifest::open(dir.path().join("run_manifest.json")).unwrap();
    manifest.add_script(script("ok", EntryStatus::Pass)).unwrap();
    manifest.add_script(script("meh", EntryStatus::Warn)).unwrap();
    manifest.add_script(script("bad", EntryStatus::Fail)).unwrap();
    manifest.add_script(script("broken", EntryStatus::Error)).unwrap();
    manifest.add_audio(audio("a1", EntryStatus::Pass)).unwrap();
    manifest.add_audio(audio("a2", EntryStatus::Fail)).unwrap();

    let failed: Vec<_> = manifest.get_failed_scripts().into_iter().map(|s| s.script_id).collect();
    assert_eq!(failed, vec!["bad", "broken"]);
    let ready: Vec<_> = manifest
        .get_scripts_ready_for_audio()
        .into_iter()
        .map(|s| s.script_id)
        .collect();
    assert_eq!(ready, vec!["ok", "meh"]);
    assert_eq!(manifest.get_failed_audio().len(), 1);
}

#[test]
fn writes_merge_with_other_handles() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let a = RunManifest::open(&logical).unwrap();
    let b = RunManifest::open(&logical).unwrap();

    a.add_script(script("from_a", EntryStatus::Pass)).unwrap();
    b.add_script(script("from_b", EntryStatus::Pass)).unwrap();

    // b re-read a's write before merging.
    assert_eq!(b.snapshot().scripts.len(), 2);
    // a's read snapshot is stale until reload.
    assert_eq!(a.snapshot().scripts.len(), 1);
    a.reload().unwrap();
    assert_eq!(a.snapshot().scripts.len(), 2);
}

#[test]
fn concurrent_upserts_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let shared = Arc::new(RunManifest::open(&logical).unwrap());
    let n = 48;

    std::thread::scope(|s| {
        for worker in 0..4 {
            let shared = Arc::clone(&shared);
            let logical = logical.clone();
            s.spawn(move || {
                // Half the workers use their own handle, like separate processes.
                let own;
                let manifest: &RunManifest = if worker % 2 == 0 {
                    &shared
                } else {
                    own = RunManifest::open(&logical).unwrap();
                    &own
                };
                for i in (worker..n).step_by(4) {
                    manifest.add_script(script(&format!("script_{i:03}"), EntryStatus::Pass)).unwrap();
                }
            });
        }
    });

    let reopened = RunManifest::open(&logical).unwrap();
    let doc = reopened.snapshot();
    assert_eq!(doc.scripts.len(), n);
    let mut ids: Vec<_> = doc.scripts.iter().map(|s| s.script_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), n);
}

#[test]
fn policy_snapshot_is_content_addressed_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = RunManifest::open(dir.path().join("run_manifest.json")).unwrap();
    let policy = json!({"enabled": true, "script": {"min_words": 10}});

    let h1 = manifest
        .save_policy_snapshot(&policy, Some(std::path::Path::new("config/quality_policy.json")))
        .unwrap();
    let h2 = manifest
        .save_policy_snapshot(&policy, Some(std::path::Path::new("config/quality_policy.json")))
        .unwrap();
    assert_eq!(h1, h2);
    assert_eq!(manifest.config_hash(), h1);

    let snapshots: Vec<_> = fs::read_dir(dir.path().join("config_snapshots"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
        .collect();
    assert_eq!(snapshots.len(), 1);

    let doc = manifest.snapshot();
    assert!(doc.config_snapshot_path.unwrap().ends_with(&format!("policy_{h1}.json")));
}

#[test]
fn start_new_run_repoints_logical_path() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let first = RunManifest::open(&logical).unwrap();
    let second = RunManifest::start_new_run(&logical).unwrap();
    assert_ne!(first.physical_path(), second.physical_path());
    assert_eq!(read_disk(&logical).run_id, second.run_id());
}

#[cfg(unix)]
#[test]
fn repointing_never_leaves_logical_path_missing() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let dir = tempfile::tempdir().unwrap();
    let location = ManifestLocation::new(dir.path().join("run_manifest.json"));
    fs::create_dir_all(location.manifests_dir()).unwrap();
    let runs = [location.physical_for("run_a"), location.physical_for("run_b")];
    for run in &runs {
        fs::write(run, "{}").unwrap();
    }
    location.point_to(&runs[0]).unwrap();

    let done = AtomicBool::new(false);
    let misses = std::thread::scope(|s| {
        let reader = s.spawn(|| {
            let mut misses = 0;
            while !done.load(Ordering::Acquire) {
                if fs::symlink_metadata(location.logical()).is_err() {
                    misses += 1;
                }
            }
            misses
        });
        for i in 0..500 {
            location.point_to(&runs[i % 2]).unwrap();
        }
        done.store(true, Ordering::Release);
        reader.join().unwrap()
    });

    assert_eq!(misses, 0);
    assert_eq!(location.resolve().unwrap(), runs[1]);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".link"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn unknown_fields_survive_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let logical = dir.path().join("run_manifest.json");
    let manifest = RunManifest::open(&logical).unwrap();
    let physical = manifest.physical_path().to_path_buf();

    let mut raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&physical).unwrap()).unwrap();
    raw["pipeline_version"] = json!("2.1");
    fs::write(&physical, serde_json::to_vec(&raw).unwrap()).unwrap();

    manifest.add_script(script("script_001", EntryStatus::Pass)).unwrap();
    let after: serde_json::Value = serde_json::from_str(&fs::read_to_string(&physical).unwrap()).unwrap();
    assert_eq!(after["pipeline_version"], "2.1");
}
