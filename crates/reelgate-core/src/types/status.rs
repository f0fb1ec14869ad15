//! Closed status/severity/kind enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Result status of a single gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pass,
    Fail,
    Warn,
    Skipped,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
            Self::Skipped => "skipped",
        }
    }

    pub fn all() -> &'static [GateStatus] {
        &[Self::Pass, Self::Fail, Self::Warn, Self::Skipped]
    }

    /// Fold a sequence of `(status, severity)` pairs into an overall status.
    ///
    /// Any critical failure wins, then any warning, then an all pass/skipped
    /// run passes. A non-critical failure (fail at warn severity) with no
    /// warnings alongside it lands in the final arm and fails the artifact.
    pub fn aggregate<I>(outcomes: I) -> GateStatus
    where
        I: IntoIterator<Item = (GateStatus, Severity)>,
    {
        let mut critical = false;
        let mut warned = false;
        let mut all_clean = true;
        for (status, severity) in outcomes {
            match (status, severity) {
                (GateStatus::Fail, Severity::Error) => critical = true,
                (GateStatus::Fail, Severity::Warn) => all_clean = false,
                (GateStatus::Warn, _) => warned = true,
                (GateStatus::Pass, _) | (GateStatus::Skipped, _) => {}
            }
        }
        if critical {
            GateStatus::Fail
        } else if warned {
            GateStatus::Warn
        } else if all_clean {
            GateStatus::Pass
        } else {
            GateStatus::Fail
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured severity of a gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    #[serde(alias = "warning")]
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Artifact families handled by the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Script,
    Audio,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Audio => "audio",
        }
    }

    pub fn all() -> &'static [ArtifactKind] {
        &[Self::Script, Self::Audio]
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
