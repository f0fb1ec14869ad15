//! Persistence errors for the run manifest, dedup index and snapshots.

use std::path::PathBuf;

use super::error_code::{self, ReelgateErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to acquire lock {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization failed for {path}: {message}")]
    Serialize { path: PathBuf, message: String },

    #[error("Atomic replace of {path} failed: {message}")]
    AtomicWrite { path: PathBuf, message: String },

    #[error("In-process lock poisoned: {0}")]
    Poisoned(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl ReelgateErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Lock { .. } | Self::Poisoned(_) => error_code::LOCK_ERROR,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
