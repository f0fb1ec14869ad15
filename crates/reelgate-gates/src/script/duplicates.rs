//! Duplicate-content detection against the shared dedup index.

use std::sync::Arc;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, Severity};
use reelgate_storage::DedupIndex;
use serde_json::Value;

use crate::gate::{Gate, GateMeta};

/// Registers every checked script's content hash, whatever the outcome, so
/// later scripts see it.
pub struct DuplicatesGate {
    meta: GateMeta,
    index: Arc<DedupIndex>,
    allow_duplicates: bool,
}

impl DuplicatesGate {
    pub fn new(name: &str, severity: Severity, index: Arc<DedupIndex>, allow_duplicates: bool) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            index,
            allow_duplicates,
        }
    }
}

impl Gate for DuplicatesGate {
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
        let hash = DedupIndex::compute_hash(script.content());
        let storage_err = |e: reelgate_core::errors::StorageError| {
            GateError::EvaluationFailed(format!("dedup index: {e}"))
        };

        let others = self.index.register(&hash, &script.id).map_err(storage_err)?;

        let outcome = if others.is_empty() {
            self.meta.pass("No duplicate content found", codes::DUPLICATE_NONE)
        } else if self.allow_duplicates {
            self.meta.pass(
                format!("Duplicate of {} earlier script(s); allowed by policy", others.len()),
                codes::DUPLICATE_ALLOWED,
            )
        } else {
            self.meta.fail(
                format!("Duplicate of {} earlier script(s)", others.len()),
                codes::DUPLICATE_FOUND,
            )
        };
        let outcome = outcome.with_detail("content_hash", hash);
        Ok(if others.is_empty() {
            outcome
        } else {
            outcome.with_detail(
                "duplicate_of",
                Value::Array(others.into_iter().map(Value::String).collect()),
            )
        })
    }
}
