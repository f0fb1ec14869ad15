//! Logical → physical manifest path resolution.
//!
//! The logical path (`quality_gates/run_manifest.json`) stays stable across
//! runs; each run owns `quality_gates/manifests/<run_id>.json`. On unix the
//! logical path is a relative symlink to the physical file. Where symlinks
//! cannot be created the logical path holds a copy, refreshed after every
//! write; tooling reading the copy sees the last persisted state.

use std::fs;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::sync::atomic::{AtomicU64, Ordering};

use reelgate_core::errors::StorageError;

use crate::atomic::atomic_write;

const MANIFESTS_DIR: &str = "manifests";

#[derive(Debug, Clone)]
pub struct ManifestLocation {
    logical: PathBuf,
    manifests_dir: PathBuf,
}

impl ManifestLocation {
    pub fn new(logical: impl Into<PathBuf>) -> Self {
        let logical = logical.into();
        let manifests_dir = logical
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(MANIFESTS_DIR);
        Self {
            logical,
            manifests_dir,
        }
    }

    pub fn logical(&self) -> &Path {
        &self.logical
    }

    pub fn manifests_dir(&self) -> &Path {
        &self.manifests_dir
    }

    pub fn physical_for(&self, run_id: &str) -> PathBuf {
        self.manifests_dir.join(format!("{run_id}.json"))
    }

    /// Where the current manifest lives, if one exists. A copy-mode logical
    /// file resolves to the per-run file named by its `run_id`, or to itself
    /// when that file is gone.
    pub fn resolve(&self) -> Option<PathBuf> {
        let meta = fs::symlink_metadata(&self.logical).ok()?;
        if meta.file_type().is_symlink() {
            let target = fs::read_link(&self.logical).ok()?;
            let target = if target.is_absolute() {
                target
            } else {
                self.logical
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(target)
            };
            return target.exists().then_some(target);
        }

        let run_id = fs::read_to_string(&self.logical)
            .ok()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
            .and_then(|v| v.get("run_id").and_then(|r| r.as_str()).map(str::to_string));
        match run_id {
            Some(id) if self.physical_for(&id).exists() => Some(self.physical_for(&id)),
            _ => Some(self.logical.clone()),
        }
    }

    /// Point the logical path at `physical`, replacing whatever was there.
    pub fn point_to(&self, physical: &Path) -> Result<(), StorageError> {
        if let Ok(meta) = fs::symlink_metadata(&self.logical) {
            if meta.is_dir() {
                return Err(StorageError::AtomicWrite {
                    path: self.logical.clone(),
                    message: "logical manifest path is a directory".to_string(),
                });
            }
        }
        if self.try_symlink(physical) {
            tracing::debug!(
                logical = %self.logical.display(),
                physical = %physical.display(),
                "manifest symlink updated"
            );
            return Ok(());
        }
        tracing::warn!(
            logical = %self.logical.display(),
            "symlinks unavailable; keeping a copy at the logical path"
        );
        let bytes = fs::read(physical).map_err(|e| StorageError::io(physical, e))?;
        atomic_write(&self.logical, &bytes)
    }

    /// After a write to the physical file: refresh the logical copy when not
    /// a symlink.
    pub fn publish(&self, physical: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if physical == self.logical {
            return Ok(());
        }
        match fs::symlink_metadata(&self.logical) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(()),
            _ => atomic_write(&self.logical, bytes),
        }
    }

    /// Builds the link under a sibling temp name and renames it over the
    /// logical path, so readers never find the logical path missing.
    #[cfg(unix)]
    fn try_symlink(&self, physical: &Path) -> bool {
        let parent = self.logical.parent().unwrap_or_else(|| Path::new("."));
        let target = physical
            .strip_prefix(parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| physical.to_path_buf());
        let staging = self.staging_path();
        let _ = fs::remove_file(&staging);
        if std::os::unix::fs::symlink(target, &staging).is_err() {
            return false;
        }
        if fs::rename(&staging, &self.logical).is_ok() {
            return true;
        }
        let _ = fs::remove_file(&staging);
        false
    }

    #[cfg(unix)]
    fn staging_path(&self) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let name = self
            .logical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        self.logical
            .with_file_name(format!(".{name}.{}.{seq}.link", std::process::id()))
    }

    #[cfg(not(unix))]
    fn try_symlink(&self, _physical: &Path) -> bool {
        false
    }
}
