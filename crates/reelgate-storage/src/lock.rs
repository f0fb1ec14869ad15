//! Two-tier advisory lock: an in-process `Mutex` serializes threads sharing
//! one handle, an `fd-lock` write lock on `<target>.lock` serializes
//! independent processes (and independent handles in the same process).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reelgate_core::errors::StorageError;

#[derive(Debug)]
pub struct FileMutex {
    lock_path: PathBuf,
    local: Mutex<()>,
}

impl FileMutex {
    /// Lock guarding `target`; the lock file sits next to it.
    pub fn for_target(target: &Path) -> Self {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        Self {
            lock_path: target.with_file_name(name),
            local: Mutex::new(()),
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Run `f` while holding both tiers. Blocks until both are acquired.
    pub fn with_lock<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce() -> Result<T, StorageError>,
    {
        // The guarded value is `()`, so a poisoned mutex carries no bad state.
        let _local = self.local.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(parent) = self.lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StorageError::Lock {
                path: self.lock_path.clone(),
                source: e,
            })?;
        let mut lock = fd_lock::RwLock::new(file);
        let _guard = lock.write().map_err(|e| StorageError::Lock {
            path: self.lock_path.clone(),
            source: e,
        })?;

        f()
    }
}
