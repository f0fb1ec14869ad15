//! Manifest entry types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reelgate_core::types::{GateOutcome, GateStatus, Severity};

/// Quality status recorded for an artifact. `Error` marks an artifact that
/// could not be loaded or checked at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Pending,
    Pass,
    Warn,
    Fail,
    Error,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Error => "error",
        }
    }

    /// Candidates for reprocessing.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail | Self::Error)
    }
}

impl From<GateStatus> for EntryStatus {
    fn from(status: GateStatus) -> Self {
        match status {
            GateStatus::Pass | GateStatus::Skipped => Self::Pass,
            GateStatus::Warn => Self::Warn,
            GateStatus::Fail => Self::Fail,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact per-gate record embedded in an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSummary {
    pub gate: String,
    pub status: GateStatus,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl From<&GateOutcome> for GateSummary {
    fn from(o: &GateOutcome) -> Self {
        Self {
            gate: o.gate().to_string(),
            status: o.status(),
            severity: o.severity(),
            message: o.message().to_string(),
            code: o.code().to_string(),
            duration_ms: o.duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityDetails {
    #[serde(default)]
    pub gates: Vec<GateSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QualityDetails {
    pub fn from_outcomes(outcomes: &[GateOutcome]) -> Self {
        Self {
            gates: outcomes.iter().map(GateSummary::from).collect(),
            error: None,
        }
    }

    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            gates: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub script_id: String,
    #[serde(default)]
    pub topic: String,
    pub path: String,
    #[serde(default)]
    pub quality_status: EntryStatus,
    #[serde(default)]
    pub ready_for_audio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub quality_details: QualityDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioEntry {
    pub audio_id: String,
    /// Originating script, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,
    pub path: String,
    #[serde(default)]
    pub quality_status: EntryStatus,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub quality_details: QualityDetails,
}
