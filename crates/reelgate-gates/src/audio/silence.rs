//! Leading, trailing and overall silence. Findings warn; they never fail.

use std::sync::Arc;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, GateStatus, Severity};

use super::analysis::{round2, silence_profile};
use super::probe::AudioProbe;
use super::probe_failure;
use crate::gate::{Gate, GateMeta};

#[derive(Debug, Clone, Copy)]
pub struct SilenceLimits {
    pub max_leading_ms: u64,
    pub max_trailing_ms: u64,
    pub max_proportion: f64,
    pub threshold_dbfs: f64,
}

pub struct SilenceGate {
    meta: GateMeta,
    limits: SilenceLimits,
    probe: Arc<dyn AudioProbe>,
}

impl SilenceGate {
    pub fn new(name: &str, severity: Severity, limits: SilenceLimits, probe: Arc<dyn AudioProbe>) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            limits,
            probe,
        }
    }
}

impl Gate for SilenceGate {
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
        if !audio.path.exists() {
            return Ok(self.meta.warn(
                format!("Audio file not found: {}", audio.path.display()),
                codes::AUDIO_FILE_MISSING,
            ));
        }
        let decoded = match self.probe.samples(&audio.path) {
            Ok(d) => d,
            Err(e) => return probe_failure(&self.meta, GateStatus::Warn, e),
        };

        let l = self.limits;
        let p = silence_profile(&decoded.samples, decoded.sample_rate, l.threshold_dbfs);
        let outcome = if p.leading_ms > l.max_leading_ms {
            self.meta.warn(
                format!("Leading silence {}ms exceeds {}ms", p.leading_ms, l.max_leading_ms),
                codes::SILENCE_LEADING_EXCESSIVE,
            )
        } else if p.trailing_ms > l.max_trailing_ms {
            self.meta.warn(
                format!("Trailing silence {}ms exceeds {}ms", p.trailing_ms, l.max_trailing_ms),
                codes::SILENCE_TRAILING_EXCESSIVE,
            )
        } else if p.proportion > l.max_proportion {
            self.meta.warn(
                format!(
                    "Silence makes up {:.0}% of the audio (maximum {:.0}%)",
                    p.proportion * 100.0,
                    l.max_proportion * 100.0
                ),
                codes::SILENCE_PROPORTION_EXCESSIVE,
            )
        } else {
            self.meta.pass("Silence within limits", codes::SILENCE_OK)
        };

        Ok(outcome
            .with_detail("leading_silence_ms", p.leading_ms)
            .with_detail("trailing_silence_ms", p.trailing_ms)
            .with_detail("silence_proportion", round2(p.proportion))
            .with_detail("threshold_dbfs", l.threshold_dbfs))
    }
}
