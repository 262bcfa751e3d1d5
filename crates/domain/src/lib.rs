pub mod error;
pub mod events;
pub mod io;
pub mod notes;
pub mod settings;
pub mod tempo;

pub use crate::error::DomainError;
pub use crate::events::{ClickLevel, TickEvent};
pub use crate::io::{load_settings, save_settings, SettingsFormat};
pub use crate::notes::{frequency_from_midi, note_from_frequency, NoteEstimate, NoteName};
pub use crate::settings::{
    MetronomeSettings, PracticeSettings, SpeedTrainerSettings, TunerSettings, Waveform,
};
pub use crate::tempo::{TempoState, TimeSignature, MAX_BPM, MIN_BPM};
