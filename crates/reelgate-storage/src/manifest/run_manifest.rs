//! `RunManifest`: locked read-merge-write ledger over a per-run JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use reelgate_core::config::policy::fingerprint_value;
use reelgate_core::errors::StorageError;
use reelgate_core::time;

use super::entries::{AudioEntry, ScriptEntry};
use super::location::ManifestLocation;
use crate::atomic::{atomic_write, atomic_write_json};
use crate::lock::FileMutex;

const SNAPSHOTS_DIR: &str = "config_snapshots";

/// On-disk manifest document. Unknown top-level fields are carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub run_id: String,
    #[serde(default)]
    pub config_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_snapshot_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
    #[serde(default)]
    pub audio: Vec<AudioEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestDocument {
    fn fresh(run_id: String) -> Self {
        let now = time::now();
        Self {
            run_id,
            config_hash: String::new(),
            config_snapshot_path: None,
            created_at: now,
            updated_at: now,
            scripts: Vec::new(),
            audio: Vec::new(),
            extra: Map::new(),
        }
    }

    fn upsert_script(&mut self, entry: ScriptEntry) {
        match self.scripts.iter_mut().find(|s| s.script_id == entry.script_id) {
            Some(existing) => *existing = entry,
            None => self.scripts.push(entry),
        }
    }

    fn upsert_audio(&mut self, entry: AudioEntry) {
        match self.audio.iter_mut().find(|a| a.audio_id == entry.audio_id) {
            Some(existing) => *existing = entry,
            None => self.audio.push(entry),
        }
    }

    /// Strictly later than the previous value even when the clock has not
    /// moved (or moved backwards).
    fn touch(&mut self) {
        let now = time::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }
}

/// Handle to the current run manifest.
///
/// Writes always re-read the file under the lock, merge, and replace it
/// atomically; reads serve the snapshot from the last load or write.
#[derive(Debug)]
pub struct RunManifest {
    location: ManifestLocation,
    physical: PathBuf,
    lock: FileMutex,
    state: RwLock<ManifestDocument>,
}

impl RunManifest {
    /// Open the manifest behind `logical`, creating a new run when there is
    /// none or the existing file is unreadable.
    pub fn open(logical: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::open_inner(logical.into(), false)
    }

    /// Always mint a new run and repoint the logical path at it.
    pub fn start_new_run(logical: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::open_inner(logical.into(), true)
    }

    fn open_inner(logical: PathBuf, force_new: bool) -> Result<Self, StorageError> {
        let location = ManifestLocation::new(logical);
        let lock = FileMutex::for_target(location.logical());

        let (physical, doc) = lock.with_lock(|| {
            if !force_new {
                if let Some(physical) = location.resolve() {
                    match read_document(&physical) {
                        Ok(doc) => {
                            tracing::info!(
                                run_id = %doc.run_id,
                                path = %physical.display(),
                                "loaded existing run manifest"
                            );
                            return Ok((physical, doc));
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %physical.display(),
                                error = %e,
                                "failed to load run manifest; starting a new run"
                            );
                        }
                    }
                }
            }
            create_run(&location)
        })?;

        Ok(Self {
            location,
            physical,
            lock,
            state: RwLock::new(doc),
        })
    }

    /// Upsert a script entry by `script_id`.
    pub fn add_script(&self, entry: ScriptEntry) -> Result<(), StorageError> {
        tracing::debug!(artifact_id = %entry.script_id, status = %entry.quality_status, "manifest add_script");
        self.mutate(|doc| doc.upsert_script(entry))
    }

    /// Upsert an audio entry by `audio_id`.
    pub fn add_audio(&self, entry: AudioEntry) -> Result<(), StorageError> {
        tracing::debug!(artifact_id = %entry.audio_id, status = %entry.quality_status, "manifest add_audio");
        self.mutate(|doc| doc.upsert_audio(entry))
    }

    pub fn set_policy_hash(&self, hash: &str) -> Result<(), StorageError> {
        let hash = hash.to_string();
        self.mutate(|doc| doc.config_hash = hash)
    }

    /// Persist `policy` under `config_snapshots/policy_<hash>.json` (once per
    /// distinct content) and record hash and snapshot path in the manifest.
    pub fn save_policy_snapshot(
        &self,
        policy: &Value,
        source_path: Option<&Path>,
    ) -> Result<String, StorageError> {
        let hash = fingerprint_value(policy);
        let dir = self
            .location
            .logical()
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SNAPSHOTS_DIR);
        let snapshot_path = dir.join(format!("policy_{hash}.json"));

        if !snapshot_path.exists() {
            let body = json!({
                "hash": hash,
                "source_path": source_path.map(|p| p.display().to_string()),
                "policy": policy,
            });
            atomic_write_json(&snapshot_path, &body)?;
            tracing::info!(policy_hash = %hash, path = %snapshot_path.display(), "policy snapshot saved");
        }

        let recorded = snapshot_path.display().to_string();
        let needs_update = {
            let state = self.read_state()?;
            state.config_hash != hash || state.config_snapshot_path.as_deref() != Some(recorded.as_str())
        };
        if needs_update {
            let hash = hash.clone();
            self.mutate(move |doc| {
                doc.config_hash = hash;
                doc.config_snapshot_path = Some(recorded);
            })?;
        }
        Ok(hash)
    }

    /// Locked re-read → apply → atomic replace → refresh snapshot.
    fn mutate<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut ManifestDocument),
    {
        self.lock.with_lock(|| {
            let mut doc = match read_document(&self.physical) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        path = %self.physical.display(),
                        error = %e,
                        "manifest unreadable during update; merging into last known state"
                    );
                    self.read_state()?.clone()
                }
            };
            apply(&mut doc);
            doc.touch();

            let bytes = atomic_write_json(&self.physical, &doc)?;
            self.location.publish(&self.physical, &bytes)?;

            let mut state = self
                .state
                .write()
                .map_err(|_| StorageError::Poisoned("run manifest state".to_string()))?;
            *state = doc;
            Ok(())
        })
    }

    /// Replace the read snapshot with the current on-disk state.
    pub fn reload(&self) -> Result<(), StorageError> {
        let doc = self.lock.with_lock(|| read_document(&self.physical))?;
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Poisoned("run manifest state".to_string()))?;
        *state = doc;
        Ok(())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, ManifestDocument>, StorageError> {
        self.state
            .read()
            .map_err(|_| StorageError::Poisoned("run manifest state".to_string()))
    }

    fn with_state<T>(&self, f: impl FnOnce(&ManifestDocument) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|p| p.into_inner());
        f(&guard)
    }

    pub fn get_script(&self, script_id: &str) -> Option<ScriptEntry> {
        self.with_state(|d| d.scripts.iter().find(|s| s.script_id == script_id).cloned())
    }

    pub fn get_audio(&self, audio_id: &str) -> Option<AudioEntry> {
        self.with_state(|d| d.audio.iter().find(|a| a.audio_id == audio_id).cloned())
    }

    /// Scripts whose latest status is `fail` or `error`.
    pub fn get_failed_scripts(&self) -> Vec<ScriptEntry> {
        self.with_state(|d| {
            d.scripts
                .iter()
                .filter(|s| s.quality_status.is_failure())
                .cloned()
                .collect()
        })
    }

    /// Audio whose latest status is `fail` or `error`.
    pub fn get_failed_audio(&self) -> Vec<AudioEntry> {
        self.with_state(|d| {
            d.audio
                .iter()
                .filter(|a| a.quality_status.is_failure())
                .cloned()
                .collect()
        })
    }

    pub fn get_scripts_ready_for_audio(&self) -> Vec<ScriptEntry> {
        self.with_state(|d| d.scripts.iter().filter(|s| s.ready_for_audio).cloned().collect())
    }

    pub fn snapshot(&self) -> ManifestDocument {
        self.with_state(ManifestDocument::clone)
    }

    pub fn run_id(&self) -> String {
        self.with_state(|d| d.run_id.clone())
    }

    pub fn config_hash(&self) -> String {
        self.with_state(|d| d.config_hash.clone())
    }

    /// Stable logical path.
    pub fn path(&self) -> &Path {
        self.location.logical()
    }

    /// Per-run file backing this handle.
    pub fn physical_path(&self) -> &Path {
        &self.physical
    }
}

fn read_document(path: &Path) -> Result<ManifestDocument, StorageError> {
    let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StorageError::Serialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Mint a run id whose per-run file does not exist yet, persist the empty
/// document and point the logical path at it. Caller holds the lock.
fn create_run(location: &ManifestLocation) -> Result<(PathBuf, ManifestDocument), StorageError> {
    let base = time::run_id_at(&time::now());
    let mut run_id = base.clone();
    let mut n = 1;
    while location.physical_for(&run_id).exists() {
        n += 1;
        run_id = format!("{base}_{n}");
    }

    let doc = ManifestDocument::fresh(run_id);
    let physical = location.physical_for(&doc.run_id);
    let bytes = serde_json::to_vec_pretty(&doc).map_err(|e| StorageError::Serialize {
        path: physical.clone(),
        message: e.to_string(),
    })?;
    atomic_write(&physical, &bytes)?;
    location.point_to(&physical)?;
    tracing::info!(run_id = %doc.run_id, path = %physical.display(), "created run manifest");
    Ok((physical, doc))
}
