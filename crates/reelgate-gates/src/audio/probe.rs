//! Audio decoding behind a trait so gates degrade when no decoder exists.

use std::path::Path;
use std::sync::Arc;

use reelgate_core::errors::GateError;

/// Header-level facts about an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMetadata {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
    pub bits_per_sample: u16,
    pub format: String,
}

impl AudioMetadata {
    /// Seconds; zero when the sample rate is zero.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames as f64 / f64::from(self.sample_rate)
        }
    }
}

/// Mono-mixed samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / f64::from(self.sample_rate)
        }
    }
}

pub trait AudioProbe: Send + Sync {
    fn metadata(&self, path: &Path) -> Result<AudioMetadata, GateError>;

    fn samples(&self, path: &Path) -> Result<Arc<DecodedAudio>, GateError>;
}

/// Probe used when the crate is built without a decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableProbe;

impl AudioProbe for UnavailableProbe {
    fn metadata(&self, _path: &Path) -> Result<AudioMetadata, GateError> {
        Err(unavailable())
    }

    fn samples(&self, _path: &Path) -> Result<Arc<DecodedAudio>, GateError> {
        Err(unavailable())
    }
}

fn unavailable() -> GateError {
    GateError::DecoderUnavailable(
        "built without an audio decoder (enable the `wav` feature)".to_string(),
    )
}

/// The best probe this build offers.
pub fn default_probe() -> Arc<dyn AudioProbe> {
    #[cfg(feature = "wav")]
    {
        Arc::new(WavProbe)
    }
    #[cfg(not(feature = "wav"))]
    {
        Arc::new(UnavailableProbe)
    }
}

#[cfg(feature = "wav")]
pub use wav::WavProbe;

#[cfg(feature = "wav")]
mod wav {
    use super::*;

    use hound::{SampleFormat, WavReader};

    /// RIFF/WAVE decoding via `hound`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WavProbe;

    fn open(path: &Path) -> Result<WavReader<std::io::BufReader<std::fs::File>>, GateError> {
        WavReader::open(path).map_err(|e| GateError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    impl AudioProbe for WavProbe {
        fn metadata(&self, path: &Path) -> Result<AudioMetadata, GateError> {
            let reader = open(path)?;
            let spec = reader.spec();
            let format = match spec.sample_format {
                SampleFormat::Int => format!("WAV PCM_{}", spec.bits_per_sample),
                SampleFormat::Float => format!("WAV FLOAT_{}", spec.bits_per_sample),
            };
            Ok(AudioMetadata {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
                frames: u64::from(reader.duration()),
                bits_per_sample: spec.bits_per_sample,
                format,
            })
        }

        fn samples(&self, path: &Path) -> Result<Arc<DecodedAudio>, GateError> {
            let mut reader = open(path)?;
            let spec = reader.spec();
            let decode_err = |e: hound::Error| GateError::Decode {
                path: path.display().to_string(),
                message: e.to_string(),
            };

            let interleaved: Vec<f32> = match spec.sample_format {
                SampleFormat::Float => reader
                    .samples::<f32>()
                    .collect::<Result<_, _>>()
                    .map_err(decode_err)?,
                SampleFormat::Int => {
                    let scale = 2f32.powi(i32::from(spec.bits_per_sample.max(1)) - 1);
                    reader
                        .samples::<i32>()
                        .map(|s| s.map(|v| v as f32 / scale))
                        .collect::<Result<_, _>>()
                        .map_err(decode_err)?
                }
            };

            let channels = usize::from(spec.channels.max(1));
            let samples = interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect();
            Ok(Arc::new(DecodedAudio {
                sample_rate: spec.sample_rate,
                samples,
            }))
        }
    }
}
