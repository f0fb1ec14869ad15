//! Façade-level errors. Aggregates subsystem errors via `From` conversions.

use super::error_code::ReelgateErrorCode;
use super::{ArtifactError, ConfigError, GateError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl ReelgateErrorCode for CheckError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Artifact(e) => e.error_code(),
            Self::Gate(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Worker(_) => super::error_code::CHECK_ERROR,
        }
    }
}
