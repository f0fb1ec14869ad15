//! Content-hash → artifact-ids index shared across workers and processes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reelgate_core::errors::StorageError;

use crate::atomic::atomic_write_json;
use crate::lock::FileMutex;

type Entries = BTreeMap<String, Vec<String>>;

/// Monotonic: ids are only ever appended. Every lookup re-reads the file, so
/// an id registered by another process is visible immediately after its
/// `add` returns.
#[derive(Debug)]
pub struct DedupIndex {
    path: PathBuf,
    lock: FileMutex,
    cache: Mutex<Entries>,
}

impl DedupIndex {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = load(&path);
        Self {
            lock: FileMutex::for_target(&path),
            path,
            cache: Mutex::new(initial),
        }
    }

    /// blake3 of the UTF-8 content, hex encoded.
    pub fn compute_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids registered under `hash`, read from the latest on-disk state.
    pub fn find(&self, hash: &str) -> Result<Vec<String>, StorageError> {
        self.lock.with_lock(|| {
            let latest = load(&self.path);
            let ids = latest.get(hash).cloned().unwrap_or_default();
            self.replace_cache(latest);
            Ok(ids)
        })
    }

    /// Register `id` under `hash`. Returns `false` when the pair was already
    /// present, in which case nothing is written.
    pub fn add(&self, hash: &str, id: &str) -> Result<bool, StorageError> {
        self.lock.with_lock(|| {
            let mut latest = load(&self.path);
            let ids = latest.entry(hash.to_string()).or_default();
            if ids.iter().any(|existing| existing == id) {
                self.replace_cache(latest);
                return Ok(false);
            }
            ids.push(id.to_string());
            atomic_write_json(&self.path, &latest)?;
            tracing::debug!(artifact_id = id, hash, "dedup index entry added");
            self.replace_cache(latest);
            Ok(true)
        })
    }

    /// Register `id` under `hash` and return the other ids already there, in
    /// one critical section. Two callers racing on the same hash always see
    /// each other.
    pub fn register(&self, hash: &str, id: &str) -> Result<Vec<String>, StorageError> {
        self.lock.with_lock(|| {
            let mut latest = load(&self.path);
            let ids = latest.entry(hash.to_string()).or_default();
            let others: Vec<String> = ids.iter().filter(|existing| *existing != id).cloned().collect();
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
                atomic_write_json(&self.path, &latest)?;
                tracing::debug!(artifact_id = id, hash, "dedup index entry added");
            }
            self.replace_cache(latest);
            Ok(others)
        })
    }

    /// Number of distinct hashes as of the last read or write.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total (hash, id) pairs as of the last read or write.
    pub fn pair_count(&self) -> usize {
        self.cache
            .lock()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn replace_cache(&self, latest: Entries) {
        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        *cache = latest;
    }
}

/// Missing or corrupt files read as empty; the next `add` rewrites them.
fn load(path: &Path) -> Entries {
    let Ok(content) = fs::read_to_string(path) else {
        return Entries::new();
    };
    match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "dedup index unreadable; treating as empty");
            Entries::new()
        }
    }
}
