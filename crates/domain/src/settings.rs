use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::notes::DEFAULT_A4_HZ;
use crate::tempo::{is_supported_bpm, TempoState, TimeSignature, DEFAULT_BPM, MAX_BPM, MIN_BPM};
use crate::DomainError;

/// Oscillator shape used for synthesized clicks.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub fn as_str(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            other => Err(DomainError::validation(format!("unknown waveform '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetronomeSettings {
    pub bpm: u32,
    pub time_signature: TimeSignature,
    pub subdivision: u32,
    pub accent: bool,
    pub sound: Waveform,
}

impl MetronomeSettings {
    /// Builds the scheduler state; out-of-range tempos are clamped.
    pub fn tempo_state(&self) -> Result<TempoState, DomainError> {
        TempoState::new(
            self.bpm,
            self.time_signature,
            self.subdivision,
            self.accent,
        )
    }
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            time_signature: TimeSignature::COMMON,
            subdivision: 1,
            accent: true,
            sound: Waveform::Sine,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TunerSettings {
    /// Reference frequency of A4 in Hz.
    pub a4: f32,
}

impl TunerSettings {
    pub const MIN_A4: f32 = 400.0;
    pub const MAX_A4: f32 = 480.0;

    pub fn new(a4: f32) -> Result<Self, DomainError> {
        let settings = Self { a4 };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(Self::MIN_A4..=Self::MAX_A4).contains(&self.a4) {
            return Err(DomainError::validation(format!(
                "reference A4 must be between {} and {} Hz, got {}",
                Self::MIN_A4,
                Self::MAX_A4,
                self.a4
            )));
        }
        Ok(())
    }
}

impl Default for TunerSettings {
    fn default() -> Self {
        Self { a4: DEFAULT_A4_HZ }
    }
}

/// Gradual tempo ramp: `start_bpm`, then `increment` more every step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpeedTrainerSettings {
    pub start_bpm: u32,
    pub end_bpm: u32,
    pub increment: u32,
    pub step_seconds: u32,
}

impl SpeedTrainerSettings {
    pub fn step_duration(&self) -> Duration {
        Duration::seconds(self.step_seconds as i64)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_supported_bpm(self.start_bpm) {
            return Err(DomainError::validation(format!(
                "start bpm must be between {MIN_BPM} and {MAX_BPM}"
            )));
        }
        if self.start_bpm >= self.end_bpm {
            return Err(DomainError::validation(
                "start bpm must be lower than end bpm",
            ));
        }
        if !(1..=50).contains(&self.increment) {
            return Err(DomainError::validation(
                "increment must be between 1 and 50 bpm",
            ));
        }
        if !(10..=600).contains(&self.step_seconds) {
            return Err(DomainError::validation(
                "step duration must be between 10 and 600 seconds",
            ));
        }
        Ok(())
    }
}

impl Default for SpeedTrainerSettings {
    fn default() -> Self {
        Self {
            start_bpm: 60,
            end_bpm: 120,
            increment: 5,
            step_seconds: 30,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeSettings {
    pub metronome: MetronomeSettings,
    pub tuner: TunerSettings,
    pub speed_trainer: SpeedTrainerSettings,
}

impl PracticeSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.metronome.tempo_state()?;
        self.tuner.validate()?;
        self.speed_trainer.validate()
    }
}
