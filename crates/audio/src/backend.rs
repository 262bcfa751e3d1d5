use fretwork_domain::{ClickLevel, TickEvent, Waveform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::click::ClickVoice;
use crate::clock::ClickSink;

/// Output format of a rendered click track.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    /// Channels of the interleaved output; every channel carries the same mix.
    pub channels: u16,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
        }
    }
}

/// Click sink that mixes every voice into a mono buffer at the sample
/// position of its scheduled time, relative to `origin` seconds.
#[derive(Debug, Clone)]
pub struct OfflineRenderer {
    config: StreamConfig,
    waveform: Waveform,
    origin: f64,
    voices: [Vec<f32>; 3],
    buffer: Vec<f32>,
    clicks: usize,
}

impl OfflineRenderer {
    pub fn new(config: StreamConfig, waveform: Waveform, origin: f64) -> Self {
        let voices = [
            ClickVoice::for_level(ClickLevel::Accent, waveform).render(config.sample_rate),
            ClickVoice::for_level(ClickLevel::Beat, waveform).render(config.sample_rate),
            ClickVoice::for_level(ClickLevel::Subdivision, waveform).render(config.sample_rate),
        ];
        Self {
            config,
            waveform,
            origin,
            voices,
            buffer: Vec::new(),
            clicks: 0,
        }
    }

    pub fn config(&self) -> StreamConfig {
        self.config
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn clicks(&self) -> usize {
        self.clicks
    }

    pub fn samples(&self) -> &[f32] {
        &self.buffer
    }

    /// Sets the track length to exactly `seconds` after the origin: pads with
    /// silence, or cuts click tails that ring past the end.
    pub fn fit_to(&mut self, seconds: f64) {
        let len = self.position_of(self.origin + seconds);
        self.buffer.resize(len, 0.0);
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.buffer
    }

    /// The mono mix duplicated into `config.channels` interleaved channels.
    pub fn interleaved(&self) -> Vec<f32> {
        let channels = usize::from(self.config.channels.max(1));
        self.buffer
            .iter()
            .flat_map(|sample| std::iter::repeat(*sample).take(channels))
            .collect()
    }

    /// Sample index of an audio-clock time; times before the origin map to 0.
    pub fn position_of(&self, time: f64) -> usize {
        ((time - self.origin) * self.config.sample_rate as f64)
            .round()
            .max(0.0) as usize
    }
}

fn voice_index(level: ClickLevel) -> usize {
    match level {
        ClickLevel::Accent => 0,
        ClickLevel::Beat => 1,
        ClickLevel::Subdivision => 2,
    }
}

impl ClickSink for OfflineRenderer {
    fn schedule_click(&mut self, tick: &TickEvent) {
        let start = self.position_of(tick.scheduled_time);
        let index = voice_index(tick.level);
        let len = self.voices[index].len();
        if self.buffer.len() < start + len {
            self.buffer.resize(start + len, 0.0);
        }
        for (out, sample) in self.buffer[start..].iter_mut().zip(&self.voices[index]) {
            *out += sample;
        }
        self.clicks += 1;
        debug!(start, level = ?tick.level, "rendered click");
    }
}
