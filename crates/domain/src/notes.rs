use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number of A4, the tuning reference pitch.
pub const A4_MIDI: i32 = 69;
pub const DEFAULT_A4_HZ: f32 = 440.0;

/// Deviation, in cents, still shown as "in tune".
pub const IN_TUNE_CENTS: f32 = 5.0;

/// Chromatic pitch classes starting at C, spelled with sharps.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Maps any integer onto the twelve pitch classes (C = 0).
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }

    pub fn is_sharp(self) -> bool {
        self.as_str().ends_with('#')
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nearest equal-tempered note to a measured frequency.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct NoteEstimate {
    pub note: NoteName,
    /// MIDI number of the nearest note.
    pub midi: i32,
    /// Signed offset from the nearest note; positive is sharp.
    pub detune_cents: f32,
}

impl NoteEstimate {
    pub fn note_index(&self) -> u8 {
        self.note.index()
    }

    /// Scientific pitch notation octave (A4 = 4).
    pub fn octave(&self) -> i32 {
        self.midi.div_euclid(12) - 1
    }

    pub fn label(&self) -> String {
        format!("{}{}", self.note, self.octave())
    }

    pub fn is_in_tune(&self) -> bool {
        self.detune_cents.abs() < IN_TUNE_CENTS
    }

    /// Tuner needle angle, 1.8 degrees per cent, pinned to a half circle.
    pub fn needle_degrees(&self) -> f32 {
        (self.detune_cents * 1.8).clamp(-90.0, 90.0)
    }
}

/// Maps a frequency to the nearest note relative to `reference_a4`, or
/// `None` unless both are positive and finite. A frequency exactly halfway
/// between two notes goes to the upper one.
pub fn note_from_frequency(frequency_hz: f32, reference_a4: f32) -> Option<NoteEstimate> {
    let is_pitch = |hz: f32| hz.is_finite() && hz > 0.0;
    if !is_pitch(frequency_hz) || !is_pitch(reference_a4) {
        return None;
    }
    let frequency = frequency_hz as f64;
    let reference = reference_a4 as f64;
    let semitones = 12.0 * (frequency / reference).log2();
    let midi = nearest_semitone(semitones) + A4_MIDI;
    let expected = reference * 2f64.powf((midi - A4_MIDI) as f64 / 12.0);
    let detune = 1200.0 * (frequency / expected).log2();
    Some(NoteEstimate {
        note: NoteName::from_index(midi),
        midi,
        detune_cents: detune as f32,
    })
}

// Ties go toward +inf, so -0.5 rounds to 0 rather than -1.
fn nearest_semitone(semitones: f64) -> i32 {
    (semitones + 0.5).floor() as i32
}

/// Equal-tempered frequency of a MIDI note relative to `reference_a4`.
pub fn frequency_from_midi(midi: i32, reference_a4: f32) -> f32 {
    reference_a4 * 2f32.powf((midi - A4_MIDI) as f32 / 12.0)
}
