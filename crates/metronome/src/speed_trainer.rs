use fretwork_domain::{DomainError, SpeedTrainerSettings};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpeedTrainerEvent {
    /// A new step began; the metronome should switch to `bpm`.
    Step { step: u32, bpm: u32 },
    /// The next step would pass the end tempo.
    Finished,
}

/// Raises the tempo by a fixed increment after every step duration.
#[derive(Debug, Clone)]
pub struct SpeedTrainer {
    settings: SpeedTrainerSettings,
    step: u32,
    elapsed_in_step: Duration,
    finished: bool,
}

impl SpeedTrainer {
    pub fn new(settings: SpeedTrainerSettings) -> Result<Self, DomainError> {
        settings.validate()?;
        Ok(Self {
            settings,
            step: 0,
            elapsed_in_step: Duration::ZERO,
            finished: false,
        })
    }

    pub fn settings(&self) -> &SpeedTrainerSettings {
        &self.settings
    }

    pub fn current_step(&self) -> u32 {
        self.step
    }

    pub fn current_bpm(&self) -> u32 {
        self.bpm_at(self.step)
    }

    pub fn next_bpm(&self) -> u32 {
        self.bpm_at(self.step + 1)
    }

    fn bpm_at(&self, step: u32) -> u32 {
        self.settings.start_bpm + step * self.settings.increment
    }

    pub fn total_steps(&self) -> u32 {
        let span = self.settings.end_bpm - self.settings.start_bpm;
        span.div_ceil(self.settings.increment)
    }

    /// Fraction of the ramp reached, counting the current step as done.
    pub fn progress(&self) -> f32 {
        let total = self.total_steps().max(1);
        ((self.step + 1) as f32 / total as f32).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn remaining_in_step(&self) -> Duration {
        self.settings.step_duration() - self.elapsed_in_step
    }

    /// Accounts `elapsed` practice time and reports every step boundary
    /// crossed.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<SpeedTrainerEvent> {
        let mut events = Vec::new();
        if self.finished || elapsed <= Duration::ZERO {
            return events;
        }
        let step_duration = self.settings.step_duration();
        self.elapsed_in_step += elapsed;
        while self.elapsed_in_step >= step_duration {
            self.elapsed_in_step -= step_duration;
            let next = self.step + 1;
            let bpm = self.bpm_at(next);
            if bpm > self.settings.end_bpm {
                info!(final_bpm = self.current_bpm(), "speed trainer finished");
                self.finished = true;
                events.push(SpeedTrainerEvent::Finished);
                break;
            }
            self.step = next;
            info!(step = next, bpm, "speed trainer step");
            events.push(SpeedTrainerEvent::Step { step: next, bpm });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(start: u32, end: u32, increment: u32) -> SpeedTrainerSettings {
        SpeedTrainerSettings {
            start_bpm: start,
            end_bpm: end,
            increment,
            step_seconds: 10,
        }
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(SpeedTrainer::new(settings(120, 100, 5)).is_err());
        assert!(SpeedTrainer::new(settings(30, 100, 5)).is_err());
    }

    #[test]
    fn steps_follow_elapsed_time() {
        let mut trainer = SpeedTrainer::new(settings(60, 70, 5)).unwrap();
        assert_eq!(trainer.current_bpm(), 60);
        assert_eq!(trainer.next_bpm(), 65);
        assert!(trainer.advance(Duration::seconds(9)).is_empty());
        assert_eq!(
            trainer.advance(Duration::seconds(1)),
            vec![SpeedTrainerEvent::Step { step: 1, bpm: 65 }]
        );
        assert_eq!(trainer.remaining_in_step(), Duration::seconds(10));
        assert_eq!(
            trainer.advance(Duration::seconds(20)),
            vec![
                SpeedTrainerEvent::Step { step: 2, bpm: 70 },
                SpeedTrainerEvent::Finished
            ]
        );
        assert!(trainer.is_finished());
        assert_eq!(trainer.current_bpm(), 70);
        assert!(trainer.advance(Duration::seconds(60)).is_empty());
    }

    #[test]
    fn uneven_ramp_stops_before_overshoot() {
        let mut trainer = SpeedTrainer::new(settings(100, 110, 4)).unwrap();
        assert_eq!(trainer.total_steps(), 3);
        let events = trainer.advance(Duration::seconds(40));
        assert_eq!(
            events,
            vec![
                SpeedTrainerEvent::Step { step: 1, bpm: 104 },
                SpeedTrainerEvent::Step { step: 2, bpm: 108 },
                SpeedTrainerEvent::Finished
            ]
        );
    }

    #[test]
    fn progress_is_bounded() {
        let mut trainer = SpeedTrainer::new(settings(60, 80, 10)).unwrap();
        assert_eq!(trainer.total_steps(), 2);
        assert_eq!(trainer.progress(), 0.5);
        trainer.advance(Duration::seconds(10));
        assert_eq!(trainer.progress(), 1.0);
        trainer.advance(Duration::seconds(10));
        assert_eq!(trainer.progress(), 1.0);
    }
}
