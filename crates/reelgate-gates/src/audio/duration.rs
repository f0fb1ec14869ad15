//! Speech-rate plausibility: audio length against the script's word count.

use std::sync::Arc;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, GateStatus, Severity};

use super::analysis::round2;
use super::probe::AudioProbe;
use super::probe_failure;
use crate::gate::{Gate, GateMeta};

pub struct DurationConsistencyGate {
    meta: GateMeta,
    min_wps: f64,
    max_wps: f64,
    probe: Arc<dyn AudioProbe>,
}

impl DurationConsistencyGate {
    pub fn new(
        name: &str,
        severity: Severity,
        (min_wps, max_wps): (f64, f64),
        probe: Arc<dyn AudioProbe>,
    ) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            min_wps,
            max_wps,
            probe,
        }
    }
}

impl Gate for DurationConsistencyGate {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Audio
    }

    fn check(&self, artifact: &Artifact) -> Result<GateOutcome, GateError> {
        let audio = self.meta.expect_audio(artifact)?;
        let words = match audio.expected_word_count {
            Some(w) if w > 0 => w,
            _ => {
                return Ok(self.meta.warn(
                    "Word count not available, cannot verify duration consistency",
                    codes::DURATION_WORD_COUNT_MISSING,
                ))
            }
        };

        let info = match self.probe.metadata(&audio.path) {
            Ok(info) => info,
            Err(e) => return probe_failure(&self.meta, GateStatus::Fail, e),
        };
        let duration = info.duration_secs();
        if duration <= 0.0 {
            return Ok(self
                .meta
                .fail(format!("Invalid duration: {duration}s"), codes::AUDIO_DURATION_INVALID)
                .with_detail("word_count", words));
        }

        let wps = words as f64 / duration;
        let outcome = if wps < self.min_wps {
            self.meta.fail(
                format!("Audio too slow: {wps:.2} words/sec (minimum: {})", self.min_wps),
                codes::DURATION_TOO_SLOW,
            )
        } else if wps > self.max_wps {
            self.meta.fail(
                format!("Audio too fast: {wps:.2} words/sec (maximum: {})", self.max_wps),
                codes::DURATION_TOO_FAST,
            )
        } else {
            self.meta.pass(
                format!("Duration consistent: {wps:.2} words/sec"),
                codes::DURATION_CONSISTENT,
            )
        };
        Ok(outcome
            .with_detail("words_per_second", round2(wps))
            .with_detail("duration", round2(duration))
            .with_detail("word_count", words)
            .with_detail("min_wps", self.min_wps)
            .with_detail("max_wps", self.max_wps))
    }
}
