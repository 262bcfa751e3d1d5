use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 240;
pub const DEFAULT_BPM: u32 = 120;

/// Clamps a tempo into the supported metronome range.
pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

pub fn is_supported_bpm(bpm: u32) -> bool {
    (MIN_BPM..=MAX_BPM).contains(&bpm)
}

/// Time signature represented as numerator over a power-of-two denominator.
///
/// Serialized as its string token (`"4/4"`, `"6/8"`), which is how the
/// settings layer and the UI exchange it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    numerator: u8,
    denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    pub fn new(numerator: u8, denominator: u8) -> Result<Self, DomainError> {
        if numerator == 0 {
            return Err(DomainError::validation(
                "time signature numerator must be positive",
            ));
        }
        if denominator == 0 || !denominator.is_power_of_two() {
            return Err(DomainError::validation(
                "time signature denominator must be power of two",
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    pub fn denominator(&self) -> u8 {
        self.denominator
    }

    /// Clicked beats in one measure. Compound meters count every pulse, so
    /// `6/8` has six beats rather than the reduced ratio.
    pub fn beats_per_measure(&self) -> u32 {
        self.numerator as u32
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = DomainError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (numerator, denominator) = token
            .trim()
            .split_once('/')
            .ok_or_else(|| DomainError::validation(format!("invalid time signature {token:?}")))?;
        let numerator = numerator.trim().parse::<u8>().map_err(|_| {
            DomainError::validation(format!("invalid time signature numerator in {token:?}"))
        })?;
        let denominator = denominator.trim().parse::<u8>().map_err(|_| {
            DomainError::validation(format!("invalid time signature denominator in {token:?}"))
        })?;
        Self::new(numerator, denominator)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(signature: TimeSignature) -> Self {
        signature.to_string()
    }
}

/// Tempo and meter owned by the beat scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoState {
    bpm: u32,
    time_signature: TimeSignature,
    subdivisions: u32,
    accent_first_beat: bool,
}

impl TempoState {
    pub fn new(
        bpm: u32,
        time_signature: TimeSignature,
        subdivisions: u32,
        accent_first_beat: bool,
    ) -> Result<Self, DomainError> {
        let mut state = Self {
            bpm: clamp_bpm(bpm),
            time_signature,
            subdivisions: 1,
            accent_first_beat,
        };
        state.set_subdivisions(subdivisions)?;
        Ok(state)
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    pub fn accent_first_beat(&self) -> bool {
        self.accent_first_beat
    }

    /// Stores the tempo clamped to [`MIN_BPM`, `MAX_BPM`] and returns it.
    pub fn set_bpm(&mut self, bpm: u32) -> u32 {
        self.bpm = clamp_bpm(bpm);
        self.bpm
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    pub fn set_subdivisions(&mut self, subdivisions: u32) -> Result<(), DomainError> {
        if subdivisions == 0 {
            return Err(DomainError::validation(
                "subdivisions per beat must be at least 1",
            ));
        }
        self.subdivisions = subdivisions;
        Ok(())
    }

    pub fn set_accent_first_beat(&mut self, accent: bool) {
        self.accent_first_beat = accent;
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Seconds between consecutive ticks, subdivisions included.
    pub fn tick_interval(&self) -> f64 {
        60.0 / self.bpm as f64 / self.subdivisions as f64
    }

    pub fn ticks_per_measure(&self) -> u32 {
        self.time_signature.beats_per_measure() * self.subdivisions
    }
}

impl Default for TempoState {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            time_signature: TimeSignature::COMMON,
            subdivisions: 1,
            accent_first_beat: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn time_signature_parsing() {
        assert_eq!("3/4".parse::<TimeSignature>().unwrap().beats_per_measure(), 3);
        assert_eq!(" 7 / 8 ".parse::<TimeSignature>().unwrap().to_string(), "7/8");
        assert!("4".parse::<TimeSignature>().is_err());
        assert!("0/4".parse::<TimeSignature>().is_err());
        assert!("3/5".parse::<TimeSignature>().is_err());
        assert!("x/4".parse::<TimeSignature>().is_err());
    }

    #[test]
    fn six_eight_counts_six_beats() {
        let signature: TimeSignature = "6/8".parse().unwrap();
        assert_eq!(signature.beats_per_measure(), 6);
    }

    #[test]
    fn time_signature_serializes_as_token() {
        let signature: TimeSignature = "6/8".parse().unwrap();
        let json = serde_json::to_string(&signature).unwrap();
        assert_eq!(json, "\"6/8\"");
        let back: TimeSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signature);
        assert!(serde_json::from_str::<TimeSignature>("\"5/3\"").is_err());
    }

    #[test]
    fn tempo_state_clamps_bpm() {
        let mut state = TempoState::default();
        assert_eq!(state.set_bpm(10), MIN_BPM);
        assert_eq!(state.set_bpm(500), MAX_BPM);
        assert_eq!(state.set_bpm(96), 96);
        let state = TempoState::new(300, TimeSignature::COMMON, 1, true).unwrap();
        assert_eq!(state.bpm(), MAX_BPM);
    }

    #[test]
    fn tempo_state_rejects_zero_subdivisions() {
        assert!(TempoState::new(120, TimeSignature::COMMON, 0, true).is_err());
        let mut state = TempoState::default();
        assert!(state.set_subdivisions(0).is_err());
        assert_eq!(state.subdivisions(), 1);
    }

    #[test]
    fn tick_interval_includes_subdivisions() {
        let state = TempoState::new(120, "6/8".parse().unwrap(), 3, true).unwrap();
        assert_relative_eq!(state.tick_interval(), 60.0 / 120.0 / 3.0);
        assert_relative_eq!(state.seconds_per_beat(), 0.5);
        assert_eq!(state.ticks_per_measure(), 18);
    }
}
