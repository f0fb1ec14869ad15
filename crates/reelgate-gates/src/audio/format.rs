//! Decoded-metadata format validity.

use std::sync::Arc;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{Artifact, ArtifactKind, GateOutcome, GateStatus, Severity};

use super::analysis::round2;
use super::probe::AudioProbe;
use super::probe_failure;
use crate::gate::{Gate, GateMeta};

pub struct AudioFormatGate {
    meta: GateMeta,
    min_sample_rate: u32,
    probe: Arc<dyn AudioProbe>,
}

impl AudioFormatGate {
    pub fn new(name: &str, severity: Severity, min_sample_rate: u32, probe: Arc<dyn AudioProbe>) -> Self {
        Self {
            meta: GateMeta::new(name, severity),
            min_sample_rate,
            probe,
        }
    }
}

impl Gate for AudioFormatGate {
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
            return Ok(self
                .meta
                .fail(
                    format!("Audio file not found: {}", audio.path.display()),
                    codes::AUDIO_FILE_MISSING,
                )
                .with_detail("path", audio.path.display().to_string()));
        }

        let info = match self.probe.metadata(&audio.path) {
            Ok(info) => info,
            Err(e) => return probe_failure(&self.meta, GateStatus::Fail, e),
        };
        let duration = info.duration_secs();
        let min = self.min_sample_rate;

        let outcome = if info.sample_rate < min {
            self.meta.fail(
                format!("Sample rate too low: {}Hz (minimum: {min}Hz)", info.sample_rate),
                codes::AUDIO_SAMPLE_RATE_LOW,
            )
        } else if !(1..=2).contains(&info.channels) {
            self.meta.fail(
                format!("Invalid channel count: {} (expected: 1-2)", info.channels),
                codes::AUDIO_CHANNELS_INVALID,
            )
        } else if duration <= 0.0 {
            self.meta.fail(
                format!("Invalid duration: {duration}s"),
                codes::AUDIO_DURATION_INVALID,
            )
        } else {
            self.meta.pass(
                format!(
                    "Audio format valid: {}Hz, {}ch, {duration:.2}s",
                    info.sample_rate, info.channels
                ),
                codes::AUDIO_FORMAT_OK,
            )
        };

        Ok(outcome
            .with_detail("sample_rate", info.sample_rate)
            .with_detail("min_sample_rate", min)
            .with_detail("channels", info.channels)
            .with_detail("duration", round2(duration))
            .with_detail("frames", info.frames)
            .with_detail("format", info.format))
    }
}
