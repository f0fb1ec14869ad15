//! Word-count bounds.

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, Severity};

use crate::gate::{Gate, GateMeta};

pub struct WordBoundsGate {
    meta: GateMeta,
    min_words: u64,
    max_words: u64,
}

impl WordBoundsGate {
    pub fn new(name: &str, severity: Severity, min_words: u64, max_words: u64) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            min_words,
            max_words,
        }
    }
}

impl Gate for WordBoundsGate {
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
        let words = script.word_count() as u64;
        let (min, max) = (self.min_words, self.max_words);

        let outcome = if words < min {
            self.meta.fail(
                format!("Script too short: {words} words (minimum: {min})"),
                codes::WORD_COUNT_TOO_LOW,
            )
        } else if words > max {
            self.meta.fail(
                format!("Script too long: {words} words (maximum: {max})"),
                codes::WORD_COUNT_TOO_HIGH,
            )
        } else {
            let o = self
                .meta
                .pass(format!("Word count OK: {words} words"), codes::WORD_COUNT_OK);
            match script.document.metadata.word_count {
                Some(declared) => o.with_detail("metadata_word_count", declared),
                None => o,
            }
        };

        Ok(outcome
            .with_detail("word_count", words)
            .with_detail("min_words", min)
            .with_detail("max_words", max))
    }
}
