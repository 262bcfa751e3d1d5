use std::future::Future;
use std::time::Duration as StdDuration;

use fretwork_audio::{AudioClock, ClickSink};
use serde::{Deserialize, Serialize};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, instrument};

use crate::scheduler::{BeatScheduler, LOOKAHEAD_INTERVAL};
use crate::speed_trainer::{SpeedTrainer, SpeedTrainerEvent};

/// Audio clock backed by the tokio timer, so paused-time tests and the
/// polling loop share one notion of "now".
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for TokioClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub polls: usize,
    pub ticks: usize,
    pub final_bpm: u32,
    pub trainer_finished: bool,
}

/// Drives a scheduler from a fixed-rate timer until shut down.
pub struct MetronomeRunner<C, S> {
    scheduler: BeatScheduler<C, S>,
    interval: StdDuration,
    trainer: Option<SpeedTrainer>,
}

impl<C: AudioClock, S: ClickSink> MetronomeRunner<C, S> {
    pub fn new(scheduler: BeatScheduler<C, S>) -> Self {
        Self {
            scheduler,
            interval: LOOKAHEAD_INTERVAL,
            trainer: None,
        }
    }

    pub fn with_interval(mut self, interval: StdDuration) -> Self {
        self.interval = interval;
        self
    }

    /// Attaches a speed trainer and switches to its starting tempo.
    pub fn with_speed_trainer(mut self, trainer: SpeedTrainer) -> Self {
        self.scheduler.set_bpm(trainer.current_bpm());
        self.trainer = Some(trainer);
        self
    }

    pub fn scheduler(&self) -> &BeatScheduler<C, S> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut BeatScheduler<C, S> {
        &mut self.scheduler
    }

    pub fn trainer(&self) -> Option<&SpeedTrainer> {
        self.trainer.as_ref()
    }

    pub fn into_scheduler(self) -> BeatScheduler<C, S> {
        self.scheduler
    }

    /// Polls until `shutdown` resolves or the scheduler is stopped through
    /// its [`StopHandle`](crate::StopHandle); always leaves it stopped.
    #[instrument(skip_all)]
    pub async fn run_until<F>(&mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        if !self.scheduler.is_running() {
            self.scheduler.start();
        }
        let mut summary = RunSummary::default();
        let mut last = Instant::now();
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    self.step_trainer(now - last);
                    last = now;
                    summary.polls += 1;
                    summary.ticks += self.scheduler.poll().len();
                    if !self.scheduler.is_running() {
                        break;
                    }
                }
            }
        }
        self.scheduler.stop();
        summary.final_bpm = self.scheduler.bpm();
        summary.trainer_finished = self.trainer.as_ref().is_some_and(SpeedTrainer::is_finished);
        info!(polls = summary.polls, ticks = summary.ticks, "metronome loop ended");
        summary
    }

    fn step_trainer(&mut self, elapsed: StdDuration) {
        let Some(trainer) = self.trainer.as_mut() else {
            return;
        };
        for event in trainer.advance(practice_time(elapsed)) {
            match event {
                SpeedTrainerEvent::Step { bpm, .. } => {
                    self.scheduler.set_bpm(bpm);
                }
                SpeedTrainerEvent::Finished => {}
            }
        }
    }
}

fn practice_time(elapsed: StdDuration) -> time::Duration {
    time::Duration::try_from(elapsed).unwrap_or(time::Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::StopHandle;
    use fretwork_audio::RecordingSink;
    use fretwork_domain::{SpeedTrainerSettings, TempoState};
    use tokio::time::sleep;

    fn runner() -> MetronomeRunner<TokioClock, RecordingSink> {
        let scheduler = BeatScheduler::new(
            TokioClock::new(),
            RecordingSink::new(),
            TempoState::default(),
        );
        MetronomeRunner::new(scheduler)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_shutdown() {
        let mut runner = runner();
        let summary = runner.run_until(sleep(StdDuration::from_millis(1_000))).await;
        assert!(!runner.scheduler().is_running());
        // 120 bpm: ticks at 0.0, 0.5 and possibly 1.0 inside the window
        assert!((2..=3).contains(&summary.ticks), "{summary:?}");
        let ticks = runner.scheduler().sink().ticks();
        assert_eq!(ticks.len(), summary.ticks);
        assert!(ticks.windows(2).all(|pair| pair[0].scheduled_time < pair[1].scheduled_time));
        assert!(summary.polls >= 39);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_handle_ends_loop() {
        let mut runner = runner();
        let handle: StopHandle = runner.scheduler().stop_handle();
        let stopper = async move {
            sleep(StdDuration::from_millis(300)).await;
            handle.stop();
            std::future::pending::<()>().await;
        };
        let summary = runner.run_until(stopper).await;
        assert_eq!(summary.ticks, 1);
        assert!(summary.polls < 20);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_trainer_raises_tempo() {
        let trainer = SpeedTrainer::new(SpeedTrainerSettings {
            start_bpm: 60,
            end_bpm: 70,
            increment: 5,
            step_seconds: 10,
        })
        .unwrap();
        let mut runner = runner().with_speed_trainer(trainer);
        assert_eq!(runner.scheduler().bpm(), 60);
        let summary = runner.run_until(sleep(StdDuration::from_secs(25))).await;
        assert_eq!(summary.final_bpm, 70);
        assert!(!summary.trainer_finished);
        assert_eq!(runner.trainer().map(SpeedTrainer::current_step), Some(2));
    }
}
