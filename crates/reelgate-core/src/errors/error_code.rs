//! ReelgateErrorCode trait for structured error strings.

/// Every error enum exposes a stable machine code so that manifest entries,
/// reports and exit paths can carry it without matching on message text.
pub trait ReelgateErrorCode {
    /// Returns the error code string (e.g., "STORAGE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SCHEMA_INVALID: &str = "SCHEMA_INVALID";
pub const GATE_ERROR: &str = "GATE_ERROR";
pub const DECODER_UNAVAILABLE: &str = "DECODER_UNAVAILABLE";
pub const ARTIFACT_ERROR: &str = "ARTIFACT_ERROR";
pub const ARTIFACT_NOT_FOUND: &str = "ARTIFACT_NOT_FOUND";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const LOCK_ERROR: &str = "LOCK_ERROR";
pub const CHECK_ERROR: &str = "CHECK_ERROR";
