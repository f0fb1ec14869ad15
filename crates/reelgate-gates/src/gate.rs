//! The gate contract.

use reelgate_core::errors::GateError;
use reelgate_core::types::{
    Artifact, ArtifactKind, AudioArtifact, GateOutcome, GateStatus, ScriptArtifact, Severity,
};

/// A named, severity-tagged check over one artifact.
///
/// Name and severity are fixed at construction. `check` may read reference
/// data (thresholds, term lists, the dedup index) but never mutates the
/// artifact. An `Err` is turned into a fail outcome by the runner.
pub trait Gate: Send + Sync {
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    /// Artifact kind this gate accepts.
    fn kind(&self) -> ArtifactKind;

    fn check(&self, artifact: &Artifact) -> Result<GateOutcome, GateError>;
}

/// Name + severity pair every built-in gate embeds; builds its outcomes.
#[derive(Debug, Clone)]
pub struct GateMeta {
    name: String,
    severity: Severity,
}

impl GateMeta {
    pub fn new(name: impl Into<String>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            severity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn outcome(&self, status: GateStatus, message: impl Into<String>, code: &str) -> GateOutcome {
        GateOutcome::new(self.name.clone(), status, self.severity, message, code)
    }

    pub fn pass(&self, message: impl Into<String>, code: &str) -> GateOutcome {
        self.outcome(GateStatus::Pass, message, code)
    }

    pub fn fail(&self, message: impl Into<String>, code: &str) -> GateOutcome {
        self.outcome(GateStatus::Fail, message, code)
    }

    pub fn warn(&self, message: impl Into<String>, code: &str) -> GateOutcome {
        self.outcome(GateStatus::Warn, message, code)
    }

    pub fn expect_script<'a>(&self, artifact: &'a Artifact) -> Result<&'a ScriptArtifact, GateError> {
        artifact.as_script().ok_or_else(|| self.unsupported(artifact))
    }

    pub fn expect_audio<'a>(&self, artifact: &'a Artifact) -> Result<&'a AudioArtifact, GateError> {
        artifact.as_audio().ok_or_else(|| self.unsupported(artifact))
    }

    fn unsupported(&self, artifact: &Artifact) -> GateError {
        GateError::UnsupportedArtifact {
            gate: self.name.clone(),
            kind: artifact.kind().as_str().to_string(),
        }
    }
}
