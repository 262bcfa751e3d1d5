use std::collections::VecDeque;

use fretwork_domain::tempo::{MAX_BPM, MIN_BPM};
use tracing::{debug, warn};

/// Taps kept for the running average.
pub const TAP_WINDOW: usize = 4;
/// Idle gap after which earlier taps no longer count.
pub const TAP_RESET_MS: f64 = 2000.0;

/// Rolling window of tap timestamps in monotonic milliseconds.
#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: VecDeque<f64>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::with_capacity(TAP_WINDOW + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }

    /// Adds a tap and returns the averaged tempo, or `None` while fewer than
    /// two taps are known or when the estimate falls outside the metronome
    /// range. Out-of-range estimates are rejected, never clamped.
    pub fn record_tap(&mut self, now_ms: f64) -> Option<u32> {
        if let Some(&last) = self.taps.back() {
            if now_ms - last > TAP_RESET_MS {
                debug!(gap_ms = now_ms - last, "tap window expired");
                self.taps.clear();
            }
        }
        self.taps.push_back(now_ms);
        while self.taps.len() > TAP_WINDOW {
            self.taps.pop_front();
        }

        let (first, last) = match (self.taps.front(), self.taps.back()) {
            (Some(first), Some(last)) if self.taps.len() >= 2 => (*first, *last),
            _ => return None,
        };
        // Mean of consecutive intervals telescopes to the overall span.
        let mean_interval = (last - first) / (self.taps.len() - 1) as f64;
        let bpm = (60_000.0 / mean_interval).round();
        if !(MIN_BPM as f64..=MAX_BPM as f64).contains(&bpm) {
            warn!(bpm, "tap tempo outside metronome range");
            return None;
        }
        Some(bpm as u32)
    }
}
