//! Per-artifact load errors.

use std::path::PathBuf;

use super::error_code::{self, ReelgateErrorCode};

/// Errors raised while loading an artifact before any gate runs.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {path}")]
    NotFound { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed artifact {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

impl ReelgateErrorCode for ArtifactError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_code::ARTIFACT_NOT_FOUND,
            _ => error_code::ARTIFACT_ERROR,
        }
    }
}
