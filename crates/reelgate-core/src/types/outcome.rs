//! Immutable per-gate outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::status::{GateStatus, Severity};

/// Key under which every outcome stores its machine code.
pub const CODE_KEY: &str = "code";
/// Key added by the runner once an outcome has been timed.
pub const DURATION_KEY: &str = "duration_ms";
/// Key holding the error text of a synthetic failure.
pub const ERROR_KEY: &str = "error";

/// Outcome of one gate against one artifact.
///
/// Built once by a gate and then only extended by value (`with_*` consume
/// `self`), so a shared outcome is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    gate: String,
    status: GateStatus,
    severity: Severity,
    message: String,
    detail: Map<String, Value>,
    timestamp: DateTime<Utc>,
}

impl GateOutcome {
    pub fn new(
        gate: impl Into<String>,
        status: GateStatus,
        severity: Severity,
        message: impl Into<String>,
        code: &str,
    ) -> Self {
        let mut detail = Map::new();
        detail.insert(CODE_KEY.to_string(), Value::from(code));
        Self {
            gate: gate.into(),
            status,
            severity,
            message: message.into(),
            detail,
            timestamp: Utc::now(),
        }
    }

    pub fn pass(gate: &str, severity: Severity, message: impl Into<String>, code: &str) -> Self {
        Self::new(gate, GateStatus::Pass, severity, message, code)
    }

    pub fn fail(gate: &str, severity: Severity, message: impl Into<String>, code: &str) -> Self {
        Self::new(gate, GateStatus::Fail, severity, message, code)
    }

    pub fn warn(gate: &str, severity: Severity, message: impl Into<String>, code: &str) -> Self {
        Self::new(gate, GateStatus::Warn, severity, message, code)
    }

    /// Placeholder for a gate that never ran because an earlier gate failed
    /// critically.
    pub fn skipped(gate: &str, severity: Severity, reason: impl Into<String>) -> Self {
        Self::new(
            gate,
            GateStatus::Skipped,
            severity,
            reason,
            crate::codes::SKIPPED_AFTER_CRITICAL,
        )
    }

    /// Synthetic failure for a gate that errored or panicked.
    pub fn errored(gate: &str, severity: Severity, error: &str) -> Self {
        Self::new(
            gate,
            GateStatus::Fail,
            severity,
            format!("Gate execution error: {error}"),
            crate::codes::GATE_EXECUTION_ERROR,
        )
        .with_detail(ERROR_KEY, error)
    }

    /// Add a detail field. `code` cannot be overwritten through this path.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key != CODE_KEY {
            self.detail.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_detail(DURATION_KEY, duration_ms)
    }

    pub fn gate(&self) -> &str {
        &self.gate
    }

    pub fn status(&self) -> GateStatus {
        self.status
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> &Map<String, Value> {
        &self.detail
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn code(&self) -> &str {
        self.detail
            .get(CODE_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.detail.get(DURATION_KEY).and_then(Value::as_u64)
    }

    /// `fail` at `error` severity.
    pub fn is_critical_failure(&self) -> bool {
        self.status == GateStatus::Fail && self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_always_present_and_protected() {
        let outcome = GateOutcome::pass("word_bounds", Severity::Error, "ok", "WORD_COUNT_OK")
            .with_detail("code", "HIJACKED")
            .with_detail("word_count", 7);
        assert_eq!(outcome.code(), "WORD_COUNT_OK");
        assert_eq!(outcome.detail()["word_count"], 7);
    }

    #[test]
    fn critical_only_for_error_severity_failures() {
        assert!(GateOutcome::fail("g", Severity::Error, "x", "C").is_critical_failure());
        assert!(!GateOutcome::fail("g", Severity::Warn, "x", "C").is_critical_failure());
        assert!(!GateOutcome::warn("g", Severity::Error, "x", "C").is_critical_failure());
    }

    #[test]
    fn errored_outcome_carries_error_text() {
        let outcome = GateOutcome::errored("g", Severity::Error, "boom").with_duration_ms(3);
        assert_eq!(outcome.status(), GateStatus::Fail);
        assert_eq!(outcome.detail()[ERROR_KEY], "boom");
        assert_eq!(outcome.duration_ms(), Some(3));
    }
}
