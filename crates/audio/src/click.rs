use std::f32::consts::TAU;

use fretwork_domain::{ClickLevel, Waveform};
use serde::{Deserialize, Serialize};

const CLICK_DURATION: f32 = 0.05;
const ATTACK: f32 = 0.01;
const RELEASE_FLOOR: f32 = 0.001;

/// Short enveloped oscillator burst used for one metronome click.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClickVoice {
    pub frequency: f32,
    pub gain: f32,
    pub duration: f32,
    pub waveform: Waveform,
}

impl ClickVoice {
    pub fn for_level(level: ClickLevel, waveform: Waveform) -> Self {
        let (frequency, gain) = match level {
            ClickLevel::Accent => (880.0, 0.4),
            ClickLevel::Beat => (440.0, 0.3),
            ClickLevel::Subdivision => (300.0, 0.15),
        };
        Self {
            frequency,
            gain,
            duration: CLICK_DURATION,
            waveform,
        }
    }

    /// Linear attack to `gain`, then exponential decay to the release floor.
    pub fn envelope(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }
        if t < ATTACK {
            return self.gain * t / ATTACK;
        }
        let progress = (t - ATTACK) / (self.duration - ATTACK);
        self.gain * (RELEASE_FLOOR / self.gain).powf(progress)
    }

    pub fn oscillator(&self, t: f32) -> f32 {
        let phase = (self.frequency * t).fract();
        match self.waveform {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }

    pub fn sample_at(&self, t: f32) -> f32 {
        self.oscillator(t) * self.envelope(t)
    }

    pub fn len_samples(&self, sample_rate: u32) -> usize {
        (self.duration * sample_rate as f32).round() as usize
    }

    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        (0..self.len_samples(sample_rate))
            .map(|i| self.sample_at(i as f32 / sample_rate as f32))
            .collect()
    }
}
