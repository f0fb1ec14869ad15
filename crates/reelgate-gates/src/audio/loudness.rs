//! Overall RMS level against a target window. Findings warn.

use std::sync::Arc;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, GateStatus, Severity};

use super::analysis::{rms_dbfs, round2};
use super::probe::AudioProbe;
use super::probe_failure;
use crate::gate::{Gate, GateMeta};

pub struct LoudnessGate {
    meta: GateMeta,
    min_dbfs: f64,
    max_dbfs: f64,
    probe: Arc<dyn AudioProbe>,
}

impl LoudnessGate {
    pub fn new(
        name: &str,
        severity: Severity,
        (min_dbfs, max_dbfs): (f64, f64),
        probe: Arc<dyn AudioProbe>,
    ) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            min_dbfs,
            max_dbfs,
            probe,
        }
    }
}

impl Gate for LoudnessGate {
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

        let level = rms_dbfs(&decoded.samples);
        let (lo, hi) = (self.min_dbfs, self.max_dbfs);
        let outcome = if level < lo {
            self.meta.warn(
                format!("Audio too quiet: {} dBFS (minimum {lo})", fmt_db(level)),
                codes::LOUDNESS_TOO_QUIET,
            )
        } else if level > hi {
            self.meta.warn(
                format!("Audio too loud: {} dBFS (maximum {hi})", fmt_db(level)),
                codes::LOUDNESS_TOO_LOUD,
            )
        } else {
            self.meta
                .pass(format!("Loudness OK: {} dBFS", fmt_db(level)), codes::LOUDNESS_OK)
        };

        Ok(outcome
            .with_detail("rms_dbfs", round2(level))
            .with_detail("target_min_dbfs", lo)
            .with_detail("target_max_dbfs", hi))
    }
}

fn fmt_db(level: f64) -> String {
    if level.is_finite() {
        format!("{level:.1}")
    } else {
        "-inf".to_string()
    }
}
