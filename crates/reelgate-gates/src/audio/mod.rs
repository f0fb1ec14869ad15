//! Built-in audio gates and the decoding they share.

pub mod analysis;
pub mod cache;
pub mod duration;
pub mod format;
pub mod loudness;
pub mod probe;
pub mod silence;

pub use cache::{CacheStats, DecodeCache};
pub use duration::DurationConsistencyGate;
pub use format::AudioFormatGate;
pub use loudness::LoudnessGate;
pub use probe::{default_probe, AudioMetadata, AudioProbe, DecodedAudio, UnavailableProbe};
#[cfg(feature = "wav")]
pub use probe::WavProbe;
pub use silence::SilenceGate;

use reelgate_core::codes;
use reelgate_core::errors::GateError;
use reelgate_core::types::{GateOutcome, GateStatus};

use crate::gate::GateMeta;

/// Turn a probe failure into an explicit outcome with `status`. Errors that
/// are not about decoding propagate.
pub(crate) fn probe_failure(
    meta: &GateMeta,
    status: GateStatus,
    err: GateError,
) -> Result<GateOutcome, GateError> {
    match err {
        GateError::DecoderUnavailable(reason) => Ok(meta
            .outcome(status, format!("Audio decoder unavailable: {reason}"), codes::DECODER_UNAVAILABLE)
            .with_detail("error", reason)),
        GateError::Decode { path, message } => Ok(meta
            .outcome(status, format!("Failed to read audio file: {message}"), codes::AUDIO_DECODE_FAILED)
            .with_detail("path", path)
            .with_detail("error", message)),
        other => Err(other),
    }
}
