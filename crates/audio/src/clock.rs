//! Capabilities shared by the tuner and the metronome: a read-only audio
//! clock and a sink that renders clicks at future clock times.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use fretwork_domain::TickEvent;
use tracing::info;

/// Monotonic audio-clock time in seconds.
pub trait AudioClock {
    fn now(&self) -> f64;
}

/// Receives clicks to synthesize at `tick.scheduled_time`, never "now".
pub trait ClickSink {
    fn schedule_click(&mut self, tick: &TickEvent);
}

impl<F> ClickSink for F
where
    F: FnMut(&TickEvent),
{
    fn schedule_click(&mut self, tick: &TickEvent) {
        self(tick)
    }
}

/// Clock advanced by hand. Clones share the same time, so a test or an
/// offline renderer can move time forward under a running scheduler.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    seconds: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds.load(Ordering::SeqCst))
    }
}

/// Wall clock measured from its creation.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Keeps every tick it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    ticks: Vec<TickEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> &[TickEvent] {
        &self.ticks
    }

    pub fn take(&mut self) -> Vec<TickEvent> {
        std::mem::take(&mut self.ticks)
    }
}

impl ClickSink for RecordingSink {
    fn schedule_click(&mut self, tick: &TickEvent) {
        self.ticks.push(*tick);
    }
}

/// Reports ticks through `tracing`; used when no audio output is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ClickSink for LogSink {
    fn schedule_click(&mut self, tick: &TickEvent) {
        info!(
            at = tick.scheduled_time,
            level = ?tick.level,
            beat = tick.beat + 1,
            sub_beat = tick.sub_beat + 1,
            "click"
        );
    }
}
