//! Look-ahead beat scheduler.
//!
//! The owner polls [`BeatScheduler::poll`] on a short, imprecise timer
//! (about every 25 ms). Each poll hands the sink every tick whose time falls
//! inside the look-ahead window, stamped with its exact audio-clock time, so
//! click timing does not depend on when the poll actually ran.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fretwork_audio::{AudioClock, ClickSink};
use fretwork_domain::{DomainError, TempoState, TickEvent, TimeSignature};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tap::TapTempo;

/// How far ahead of the audio clock ticks are handed to the sink.
pub const SCHEDULE_AHEAD_SECONDS: f64 = 0.1;
/// Suggested polling period for the owner of the loop.
pub const LOOKAHEAD_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Shared running flag. Stopping through any clone takes effect before the
/// next tick, including from inside a sink during a poll.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

pub struct BeatScheduler<C, S> {
    clock: C,
    sink: S,
    tempo: TempoState,
    schedule_ahead: f64,
    running: StopHandle,
    next_event_time: f64,
    counter: u32,
    taps: TapTempo,
}

impl<C: AudioClock, S: ClickSink> BeatScheduler<C, S> {
    pub fn new(clock: C, sink: S, tempo: TempoState) -> Self {
        Self {
            clock,
            sink,
            tempo,
            schedule_ahead: SCHEDULE_AHEAD_SECONDS,
            running: StopHandle::default(),
            next_event_time: 0.0,
            counter: 0,
            taps: TapTempo::new(),
        }
    }

    pub fn with_schedule_ahead(mut self, seconds: f64) -> Self {
        self.schedule_ahead = seconds;
        self
    }

    /// Shares an existing flag, e.g. one already handed to the sink.
    pub fn with_stop_handle(mut self, handle: StopHandle) -> Self {
        handle.set_running(self.running.is_running());
        self.running = handle;
        self
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.is_running() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.running.clone()
    }

    pub fn tempo(&self) -> &TempoState {
        &self.tempo
    }

    pub fn bpm(&self) -> u32 {
        self.tempo.bpm()
    }

    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    /// Position of the next tick inside the measure, subdivisions included.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn start(&mut self) {
        self.counter = 0;
        self.next_event_time = self.clock.now();
        self.running.set_running(true);
        info!(
            bpm = self.tempo.bpm(),
            signature = %self.tempo.time_signature(),
            subdivisions = self.tempo.subdivisions(),
            at = self.next_event_time,
            "metronome started"
        );
    }

    pub fn stop(&mut self) {
        if self.running.is_running() {
            info!(at = self.clock.now(), "metronome stopped");
        }
        self.running.set_running(false);
    }

    pub fn toggle(&mut self) -> SchedulerState {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.state()
    }

    // Tempo changes restart the loop so no tick keeps the old spacing.
    fn restart_if_running(&mut self) {
        if self.is_running() {
            debug!("restarting metronome after tempo change");
            self.stop();
            self.start();
        }
    }

    /// Sets the tempo (clamped to the supported range) and returns it.
    pub fn set_bpm(&mut self, bpm: u32) -> u32 {
        let applied = self.tempo.set_bpm(bpm);
        self.restart_if_running();
        applied
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.tempo.set_time_signature(time_signature);
        self.restart_if_running();
    }

    pub fn set_subdivisions(&mut self, subdivisions: u32) -> Result<(), DomainError> {
        self.tempo.set_subdivisions(subdivisions)?;
        self.restart_if_running();
        Ok(())
    }

    pub fn set_accent_first_beat(&mut self, accent: bool) {
        self.tempo.set_accent_first_beat(accent);
        self.restart_if_running();
    }

    /// Records a tap (monotonic milliseconds). An accepted estimate becomes
    /// the new tempo; a rejected one leaves the tempo untouched.
    pub fn tap(&mut self, now_ms: f64) -> Option<u32> {
        let bpm = self.taps.record_tap(now_ms)?;
        Some(self.set_bpm(bpm))
    }

    /// Emits every tick due before `now + schedule_ahead` and returns them in
    /// emission order.
    pub fn poll(&mut self) -> Vec<TickEvent> {
        let mut emitted = Vec::new();
        while self.running.is_running()
            && self.next_event_time < self.clock.now() + self.schedule_ahead
        {
            let subdivisions = self.tempo.subdivisions();
            let tick = TickEvent::new(
                self.next_event_time,
                self.counter / subdivisions,
                self.counter % subdivisions,
                self.tempo.accent_first_beat(),
            );
            self.sink.schedule_click(&tick);
            emitted.push(tick);
            self.next_event_time += self.tempo.tick_interval();
            self.counter = (self.counter + 1) % self.tempo.ticks_per_measure();
        }
        if !emitted.is_empty() {
            debug!(count = emitted.len(), next = self.next_event_time, "scheduled ticks");
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fretwork_audio::{ManualClock, RecordingSink};
    use fretwork_domain::ClickLevel;

    fn scheduler(tempo: TempoState) -> (ManualClock, BeatScheduler<ManualClock, RecordingSink>) {
        let clock = ManualClock::new(0.0);
        let scheduler = BeatScheduler::new(clock.clone(), RecordingSink::new(), tempo);
        (clock, scheduler)
    }

    fn run_for(clock: &ManualClock, scheduler: &mut BeatScheduler<ManualClock, RecordingSink>, seconds: f64) {
        let steps = (seconds / 0.025).round() as usize;
        for _ in 0..steps {
            scheduler.poll();
            clock.advance(0.025);
        }
    }

    #[test]
    fn stopped_scheduler_emits_nothing() {
        let (clock, mut scheduler) = scheduler(TempoState::default());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        run_for(&clock, &mut scheduler, 1.0);
        assert!(scheduler.sink().ticks().is_empty());
    }

    #[test]
    fn start_anchors_at_clock_time() {
        let (clock, mut scheduler) = scheduler(TempoState::default());
        clock.set(5.0);
        scheduler.start();
        let ticks = scheduler.poll();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].scheduled_time, 5.0);
        assert_eq!(ticks[0].level, ClickLevel::Accent);
        assert_relative_eq!(scheduler.next_event_time(), 5.5);
    }

    #[test]
    fn look_ahead_covers_window() {
        let tempo = TempoState::new(240, TimeSignature::COMMON, 4, true).unwrap();
        let (_clock, mut scheduler) = scheduler(tempo);
        scheduler.start();
        // 62.5 ms spacing: ticks at 0 and 62.5 ms fall inside 100 ms
        let ticks = scheduler.poll();
        assert_eq!(ticks.len(), 2);
        assert!(scheduler.poll().is_empty());
    }

    #[test]
    fn accent_pattern_in_three_four_with_triplets() {
        let tempo = TempoState::new(60, "3/4".parse().unwrap(), 3, true).unwrap();
        let (clock, mut scheduler) = scheduler(tempo);
        scheduler.start();
        run_for(&clock, &mut scheduler, 3.2);
        let levels: Vec<ClickLevel> = scheduler.sink().ticks().iter().map(|t| t.level).collect();
        use ClickLevel::*;
        assert_eq!(
            &levels[..10],
            &[
                Accent, Subdivision, Subdivision, Beat, Subdivision, Subdivision, Beat,
                Subdivision, Subdivision, Accent
            ]
        );
    }

    #[test]
    fn no_accent_when_disabled() {
        let tempo = TempoState::new(120, TimeSignature::COMMON, 1, false).unwrap();
        let (clock, mut scheduler) = scheduler(tempo);
        scheduler.start();
        run_for(&clock, &mut scheduler, 3.0);
        assert!(scheduler
            .sink()
            .ticks()
            .iter()
            .all(|tick| tick.level == ClickLevel::Beat));
    }

    #[test]
    fn counter_wraps_per_measure() {
        let tempo = TempoState::new(120, "6/8".parse().unwrap(), 2, true).unwrap();
        let (clock, mut scheduler) = scheduler(tempo);
        scheduler.start();
        run_for(&clock, &mut scheduler, 3.2);
        let ticks = scheduler.sink().ticks();
        assert_eq!(ticks[11].beat, 5);
        assert_eq!(ticks[11].sub_beat, 1);
        assert_eq!(ticks[12].level, ClickLevel::Accent);
        assert_eq!(ticks[12].beat, 0);
    }

    #[test]
    fn stop_halts_emission() {
        let (clock, mut scheduler) = scheduler(TempoState::default());
        scheduler.start();
        run_for(&clock, &mut scheduler, 1.0);
        let emitted = scheduler.sink().ticks().len();
        scheduler.stop();
        run_for(&clock, &mut scheduler, 2.0);
        assert_eq!(scheduler.sink().ticks().len(), emitted);
    }

    #[test]
    fn set_bpm_restarts_in_place() {
        let (clock, mut scheduler) = scheduler(TempoState::default());
        scheduler.start();
        run_for(&clock, &mut scheduler, 0.6);
        assert_eq!(scheduler.set_bpm(90), 90);
        assert!(scheduler.is_running());
        assert_eq!(scheduler.counter(), 0);
        assert_relative_eq!(scheduler.next_event_time(), clock.now());
        let ticks = scheduler.poll();
        assert_eq!(ticks[0].level, ClickLevel::Accent);
    }

    #[test]
    fn setters_apply_while_stopped_without_starting() {
        let (_clock, mut scheduler) = scheduler(TempoState::default());
        assert_eq!(scheduler.set_bpm(500), 240);
        scheduler.set_time_signature("6/8".parse().unwrap());
        scheduler.set_subdivisions(2).unwrap();
        scheduler.set_accent_first_beat(false);
        assert!(scheduler.set_subdivisions(0).is_err());
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.tempo().ticks_per_measure(), 12);
    }

    #[test]
    fn tap_updates_tempo() {
        let (_clock, mut scheduler) = scheduler(TempoState::default());
        for (i, expected) in [None, Some(100), Some(100)].into_iter().enumerate() {
            assert_eq!(scheduler.tap(i as f64 * 600.0), expected);
        }
        assert_eq!(scheduler.bpm(), 100);
    }

    #[test]
    fn toggle_flips_state() {
        let (_clock, mut scheduler) = scheduler(TempoState::default());
        assert_eq!(scheduler.toggle(), SchedulerState::Running);
        assert_eq!(scheduler.toggle(), SchedulerState::Stopped);
    }
}
