use fretwork_domain::{note_from_frequency, DomainError, NoteEstimate, TunerSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pitch::PitchDetector;

/// Default analysis frame, matching a 2048-point analyser window.
pub const DEFAULT_FRAME_SIZE: usize = 2048;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TunerReading {
    pub frequency_hz: f32,
    pub estimate: NoteEstimate,
}

/// A reading tagged with the stream position of its frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimedReading {
    pub start_seconds: f64,
    pub reading: TunerReading,
}

/// Pitch detector bound to a reference tuning.
#[derive(Debug, Clone)]
pub struct Tuner {
    detector: PitchDetector,
    settings: TunerSettings,
}

impl Tuner {
    pub fn new(settings: TunerSettings) -> Result<Self, DomainError> {
        settings.validate()?;
        Ok(Self {
            detector: PitchDetector::default(),
            settings,
        })
    }

    pub fn with_detector(mut self, detector: PitchDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn reference_a4(&self) -> f32 {
        self.settings.a4
    }

    pub fn set_reference_a4(&mut self, a4: f32) -> Result<(), DomainError> {
        self.settings = TunerSettings::new(a4)?;
        Ok(())
    }

    /// One detection pass; `None` means "skip this UI update".
    pub fn analyze(&self, samples: &[f32], sample_rate: f32) -> Option<TunerReading> {
        let frequency_hz = self.detector.detect(samples, sample_rate)?;
        let estimate = note_from_frequency(frequency_hz, self.settings.a4)?;
        debug!(frequency_hz, note = %estimate.label(), cents = estimate.detune_cents, "tuner reading");
        Some(TunerReading {
            frequency_hz,
            estimate,
        })
    }

    /// Analyzes consecutive non-overlapping frames of a recording.
    pub fn scan(
        &self,
        samples: &[f32],
        sample_rate: f32,
        frame_size: usize,
    ) -> Result<Vec<TimedReading>, DomainError> {
        let mut windower = FrameWindower::new(frame_size)?;
        windower.push(samples);
        let mut readings = Vec::new();
        let mut start = 0usize;
        while let Some(frame) = windower.next_frame() {
            if let Some(reading) = self.analyze(&frame, sample_rate) {
                readings.push(TimedReading {
                    start_seconds: start as f64 / sample_rate as f64,
                    reading,
                });
            }
            start += frame_size;
        }
        Ok(readings)
    }
}

impl Default for Tuner {
    fn default() -> Self {
        Self {
            detector: PitchDetector::default(),
            settings: TunerSettings::default(),
        }
    }
}

/// Collects arbitrarily sized input chunks into fixed power-of-two frames.
#[derive(Debug, Clone)]
pub struct FrameWindower {
    frame_size: usize,
    pending: Vec<f32>,
}

impl FrameWindower {
    pub fn new(frame_size: usize) -> Result<Self, DomainError> {
        if frame_size < 2 || !frame_size.is_power_of_two() {
            return Err(DomainError::validation(format!(
                "frame size must be a power of two, got {frame_size}"
            )));
        }
        Ok(Self {
            frame_size,
            pending: Vec::with_capacity(frame_size * 2),
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, chunk: &[f32]) {
        self.pending.extend_from_slice(chunk);
    }

    pub fn next_frame(&mut self) -> Option<Vec<f32>> {
        if self.pending.len() < self.frame_size {
            return None;
        }
        Some(self.pending.drain(..self.frame_size).collect())
    }
}
