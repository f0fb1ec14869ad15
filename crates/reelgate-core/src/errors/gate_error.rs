//! Per-gate execution errors.
//!
//! These never escape a run: the runner turns them into synthetic fail
//! outcomes carrying the error text.

use super::error_code::{self, ReelgateErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Gate evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Gate {gate} does not accept {kind} artifacts")]
    UnsupportedArtifact { gate: String, kind: String },

    #[error("Decoder unavailable: {0}")]
    DecoderUnavailable(String),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Gate construction failed for {gate}: {message}")]
    Construction { gate: String, message: String },

    #[error("Gate panicked: {0}")]
    Panicked(String),
}

impl ReelgateErrorCode for GateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DecoderUnavailable(_) => error_code::DECODER_UNAVAILABLE,
            _ => error_code::GATE_ERROR,
        }
    }
}
