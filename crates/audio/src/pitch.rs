//! Autocorrelation pitch detection.
//!
//! The detector gates silence on RMS, crops the frame to its quiet edges,
//! walks past the zero-lag lobe of the autocorrelation and takes the
//! strongest remaining lag as the period, refined with a parabola through
//! its neighbours. Past the silence gate it always answers with a number:
//! correlation strength is not checked.

use tracing::debug;

use crate::dsp::{autocorrelate, parabolic_offset, rms, trim_quiet_edges};

/// Frames quieter than this RMS level carry no pitch.
pub const SILENCE_RMS: f32 = 0.01;
/// Magnitude below which a sample counts as a quiet edge when trimming.
pub const TRIM_THRESHOLD: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchDetector {
    pub silence_rms: f32,
    pub trim_threshold: f32,
}

impl Default for PitchDetector {
    fn default() -> Self {
        Self {
            silence_rms: SILENCE_RMS,
            trim_threshold: TRIM_THRESHOLD,
        }
    }
}

impl PitchDetector {
    /// Estimated fundamental frequency in Hz, or `None` for silence.
    pub fn detect(&self, samples: &[f32], sample_rate: f32) -> Option<f32> {
        let level = rms(samples);
        if level < self.silence_rms {
            debug!(level, "frame below silence gate");
            return None;
        }
        let trimmed = trim_quiet_edges(samples, self.trim_threshold);
        let correlation = autocorrelate(trimmed);
        let period = estimate_period(&correlation)?;
        let frequency = sample_rate / period;
        // A zero period (flat or empty correlation) has no finite pitch.
        if !frequency.is_finite() || frequency <= 0.0 {
            debug!(period, "degenerate autocorrelation period");
            return None;
        }
        Some(frequency)
    }
}

/// Shorthand for [`PitchDetector::default`]`.detect(..)`.
pub fn detect_pitch(samples: &[f32], sample_rate: f32) -> Option<f32> {
    PitchDetector::default().detect(samples, sample_rate)
}

/// Period in (fractional) samples from an autocorrelation sequence.
pub fn estimate_period(correlation: &[f32]) -> Option<f32> {
    if correlation.is_empty() {
        return None;
    }
    let mut dip = 0;
    while dip + 1 < correlation.len() && correlation[dip] > correlation[dip + 1] {
        dip += 1;
    }

    let mut peak = dip;
    for (lag, value) in correlation.iter().enumerate().skip(dip) {
        if *value > correlation[peak] {
            peak = lag;
        }
    }

    let mut period = peak as f32;
    if peak > 0 && peak + 1 < correlation.len() {
        if let Some(offset) = parabolic_offset(
            correlation[peak - 1],
            correlation[peak],
            correlation[peak + 1],
        ) {
            period += offset;
        }
    }
    Some(period)
}
