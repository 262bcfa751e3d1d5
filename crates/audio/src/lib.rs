pub mod backend;
pub mod click;
pub mod clock;
pub mod dsp;
pub mod io;
pub mod pitch;
pub mod tuner;

pub use backend::{OfflineRenderer, StreamConfig};
pub use click::ClickVoice;
pub use clock::{AudioClock, ClickSink, LogSink, ManualClock, RecordingSink, SystemClock};
pub use io::{AudioDecoder, MonoAudio};
pub use pitch::{detect_pitch, PitchDetector};
pub use tuner::{FrameWindower, TimedReading, Tuner, TunerReading, DEFAULT_FRAME_SIZE};
