//! Span and event field names shared across crates, so log queries can rely
//! on one vocabulary.

/// Identifier of the run being written to.
pub const RUN_ID: &str = "run_id";

/// Artifact identifier (script id or audio id).
pub const ARTIFACT_ID: &str = "artifact_id";

/// `script` or `audio`.
pub const ARTIFACT_KIND: &str = "artifact_kind";

/// Gate name.
pub const GATE: &str = "gate";

/// Gate evaluation time in milliseconds.
pub const GATE_DURATION_MS: &str = "gate_duration_ms";

/// Whole-artifact check time in milliseconds.
pub const CHECK_DURATION_MS: &str = "check_duration_ms";

/// Policy fingerprint.
pub const POLICY_HASH: &str = "policy_hash";

/// Decode cache hit rate (0.0 - 1.0).
pub const CACHE_HIT_RATE: &str = "cache_hit_rate";
