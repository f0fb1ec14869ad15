//! Case-insensitive forbidden-term scan.

use std::path::Path;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, Severity};
use serde_json::Value;

use crate::gate::{Gate, GateMeta};

pub struct ForbiddenTermsGate {
    meta: GateMeta,
    /// Lowercased, non-empty.
    terms: Vec<String>,
}

impl ForbiddenTermsGate {
    pub fn new<I, S>(name: &str, severity: Severity, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            meta: GateMeta::new(name, severity),
            terms,
        }
    }

    /// One term per line; blank lines and `#` comments are ignored.
    pub fn from_file(name: &str, severity: Severity, path: &Path) -> Result<Self, GateError> {
        let content = std::fs::read_to_string(path).map_err(|e| GateError::Construction {
            gate: name.to_string(),
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let terms = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        Ok(Self::new(name, severity, terms))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Gate for ForbiddenTermsGate {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Script
    }

    fn check(&self, artifact: &Artifact) -> Result<GateOutcome, GateError> {
        let script = self.meta.expect_script(artifact)?;
        let content = script.content().to_lowercase();
        let found: Vec<&String> = self.terms.iter().filter(|t| content.contains(t.as_str())).collect();

        if found.is_empty() {
            return Ok(self
                .meta
                .pass("No forbidden terms found", codes::FORBIDDEN_TERMS_NONE)
                .with_detail("checked_terms_count", self.terms.len()));
        }
        Ok(self
            .meta
            .fail(
                format!("Found {} forbidden term(s)", found.len()),
                codes::FORBIDDEN_TERMS_FOUND,
            )
            .with_detail(
                "found_terms",
                Value::Array(found.into_iter().map(|t| Value::String(t.clone())).collect()),
            )
            .with_detail("forbidden_terms_count", self.terms.len()))
    }
}
