//! Error handling for reelgate.
//! One error enum per subsystem, `thiserror` only.

pub mod artifact_error;
pub mod check_error;
pub mod config_error;
pub mod error_code;
pub mod gate_error;
pub mod storage_error;

pub use artifact_error::ArtifactError;
pub use check_error::CheckError;
pub use config_error::ConfigError;
pub use error_code::ReelgateErrorCode;
pub use gate_error::GateError;
pub use storage_error::StorageError;
