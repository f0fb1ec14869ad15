//! Level analysis over decoded samples.

/// Analysis window.
pub const FRAME_MS: u64 = 10;

/// dBFS of a block; `-inf` for digital silence.
pub fn rms_dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms == 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * rms.log10()
    }
}

/// Leading, trailing and total silence, from 10 ms frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceProfile {
    pub leading_ms: u64,
    pub trailing_ms: u64,
    /// Share of silent frames, `0.0..=1.0`.
    pub proportion: f64,
}

pub fn silence_profile(samples: &[f32], sample_rate: u32, threshold_dbfs: f64) -> SilenceProfile {
    let frame_len = ((u64::from(sample_rate) * FRAME_MS) / 1000).max(1) as usize;
    let silent: Vec<bool> = samples
        .chunks(frame_len)
        .map(|frame| rms_dbfs(frame) < threshold_dbfs)
        .collect();
    if silent.is_empty() {
        return SilenceProfile {
            leading_ms: 0,
            trailing_ms: 0,
            proportion: 1.0,
        };
    }
    let leading = silent.iter().take_while(|&&s| s).count() as u64;
    let trailing = silent.iter().rev().take_while(|&&s| s).count() as u64;
    let total = silent.iter().filter(|&&s| s).count();
    SilenceProfile {
        leading_ms: leading * FRAME_MS,
        trailing_ms: trailing * FRAME_MS,
        proportion: total as f64 / silent.len() as f64,
    }
}

/// JSON-safe rounding; non-finite values become `None`.
pub fn round2(x: f64) -> Option<f64> {
    x.is_finite().then(|| (x * 100.0).round() / 100.0)
}
