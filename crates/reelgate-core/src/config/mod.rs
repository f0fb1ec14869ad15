//! Configuration system for reelgate.
//!
//! Two documents: the JSON quality policy (which gates run, in what order, at
//! which severity, with which thresholds) and the TOML checker config (where
//! output goes and how batches execute).

pub mod checker_config;
pub mod policy;

pub use checker_config::{CheckerConfig, CheckerOverrides, QualityPaths};
pub use policy::{AudioPolicy, GateOrdering, QualityPolicy, ScriptPolicy};
