use serde::{Deserialize, Serialize};

/// Loudness tier of a metronome click.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClickLevel {
    Accent,
    Beat,
    Subdivision,
}

impl ClickLevel {
    /// Level of the tick at `main_beat`/`sub_beat` inside a measure.
    pub fn classify(main_beat: u32, sub_beat: u32, accent_first_beat: bool) -> Self {
        match (main_beat, sub_beat) {
            (0, 0) if accent_first_beat => ClickLevel::Accent,
            (_, 0) => ClickLevel::Beat,
            _ => ClickLevel::Subdivision,
        }
    }

    /// Main beats flash the visual indicator; subdivisions do not.
    pub fn is_main_beat(self) -> bool {
        !matches!(self, ClickLevel::Subdivision)
    }
}

/// A click scheduled against the audio clock.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TickEvent {
    /// Audio-clock seconds at which the click must sound.
    pub scheduled_time: f64,
    pub level: ClickLevel,
    /// Beat within the measure, zero based.
    pub beat: u32,
    /// Subdivision within the beat, zero based.
    pub sub_beat: u32,
}

impl TickEvent {
    pub fn new(scheduled_time: f64, beat: u32, sub_beat: u32, accent_first_beat: bool) -> Self {
        Self {
            scheduled_time,
            level: ClickLevel::classify(beat, sub_beat, accent_first_beat),
            beat,
            sub_beat,
        }
    }
}
