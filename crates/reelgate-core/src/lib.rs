//! # reelgate-core
//!
//! Shared foundation for the reelgate quality gate subsystem: artifact and
//! outcome types, error enums, the quality policy, checker configuration,
//! the structural schema validator and tracing setup.

// Each error enum carries path context so the CLI can point at the file.
#![allow(clippy::result_large_err)]

pub mod codes;
pub mod config;
pub mod errors;
pub mod schema;
pub mod time;
pub mod tracing;
pub mod types;

pub use config::{CheckerConfig, QualityPolicy};
pub use errors::ReelgateErrorCode;
pub use types::{Artifact, ArtifactKind, GateOutcome, GateStatus, Severity};
