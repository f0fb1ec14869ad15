//! Configuration errors. Always fatal at load time.

use super::error_code::{self, ReelgateErrorCode};

/// Errors that can occur during policy/config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Policy invalid per schema {schema}:\n  - {}", errors.join("\n  - "))]
    SchemaViolations { schema: String, errors: Vec<String> },
}

impl ReelgateErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaViolations { .. } => error_code::SCHEMA_INVALID,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
