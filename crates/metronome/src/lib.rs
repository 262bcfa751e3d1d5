//! Metronome core: a look-ahead beat scheduler polled by its owner, tap
//! tempo, and a speed trainer that ramps the tempo over time.

pub mod runner;
pub mod scheduler;
pub mod speed_trainer;
pub mod tap;

pub use runner::{MetronomeRunner, RunSummary, TokioClock};
pub use scheduler::{
    BeatScheduler, SchedulerState, StopHandle, LOOKAHEAD_INTERVAL, SCHEDULE_AHEAD_SECONDS,
};
pub use speed_trainer::{SpeedTrainer, SpeedTrainerEvent};
pub use tap::TapTempo;
