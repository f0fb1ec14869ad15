//! Structural completeness of the narration text.

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, GateStatus, Severity};

use crate::gate::{Gate, GateMeta};

const TERMINATORS: &[char] = &['.', '!', '?', '…'];
const DANGLING_PUNCTUATION: &[char] = &[',', ':', ';'];
/// Trailing characters that may follow the final terminator.
const CLOSERS: &[char] = &['"', '\'', '”', '’', '»', ')', ']'];
const MIN_SENTENCES: usize = 2;

/// Conjunctions a sentence cannot end on (Portuguese and English).
const DANGLING_WORDS: &[&str] = &[
    "e", "mas", "ou", "porque", "pois", "porém", "que", "quando", "então", "como", "se", "nem",
    "and", "but", "or", "because", "so", "that",
];

pub struct CompletenessGate {
    meta: GateMeta,
    /// When a repair step follows generation, violations only warn.
    assisted: bool,
}

impl CompletenessGate {
    pub fn new(name: &str, severity: Severity, assisted: bool) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            assisted,
        }
    }

    fn violation(&self, message: String, code: &str) -> GateOutcome {
        let status = if self.assisted {
            GateStatus::Warn
        } else {
            GateStatus::Fail
        };
        self.meta
            .outcome(status, message, code)
            .with_detail("llm_assisted", self.assisted)
    }
}

/// Number of terminator runs; "..." and "?!" count once.
fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_run = false;
    for c in text.chars() {
        if TERMINATORS.contains(&c) {
            if !in_run {
                count += 1;
            }
            in_run = true;
        } else {
            in_run = false;
        }
    }
    count
}

fn last_word(text: &str) -> Option<String> {
    text.split_whitespace()
        .last()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

impl Gate for CompletenessGate {
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
        let text = script.content().trim_end();
        let body = text.trim_end_matches(CLOSERS);

        if body.ends_with(DANGLING_PUNCTUATION) {
            return Ok(self.violation(
                "Script ends mid-sentence (dangling punctuation)".to_string(),
                codes::SCRIPT_DANGLING_ENDING,
            ));
        }
        if let Some(word) = last_word(body) {
            if DANGLING_WORDS.contains(&word.as_str()) {
                return Ok(self
                    .violation(
                        format!("Script ends on a conjunction: '{word}'"),
                        codes::SCRIPT_DANGLING_ENDING,
                    )
                    .with_detail("last_word", word));
            }
        }
        if !body.ends_with(TERMINATORS) {
            return Ok(self.violation(
                "Script does not end with terminal punctuation".to_string(),
                codes::SCRIPT_NO_TERMINAL_PUNCTUATION,
            ));
        }
        let sentences = count_sentences(body);
        if sentences < MIN_SENTENCES {
            return Ok(self
                .violation(
                    format!("Script has {sentences} sentence(s); at least {MIN_SENTENCES} required"),
                    codes::SCRIPT_TOO_FEW_SENTENCES,
                )
                .with_detail("sentences", sentences));
        }

        Ok(self
            .meta
            .pass(format!("Script is complete ({sentences} sentences)"), codes::SCRIPT_COMPLETE)
            .with_detail("sentences", sentences))
    }
}
