//! Offline metronome rendering: drives the scheduler from a hand-advanced
//! clock and mixes every click into a buffer.

use std::path::Path;

use anyhow::{Context, Result};
use fretwork_audio::{AudioClock, ClickSink, ManualClock, OfflineRenderer, StreamConfig};
use fretwork_domain::{TempoState, Waveform};
use fretwork_metronome::{
    BeatScheduler, SpeedTrainer, SpeedTrainerEvent, LOOKAHEAD_INTERVAL, SCHEDULE_AHEAD_SECONDS,
};
use tracing::info;

#[derive(Debug, Clone)]
pub struct RenderedClicks {
    /// Interleaved samples, `config.channels` per frame.
    pub samples: Vec<f32>,
    pub config: StreamConfig,
    pub clicks: usize,
    pub final_bpm: u32,
}

pub fn render_clicks(
    tempo: TempoState,
    waveform: Waveform,
    seconds: f64,
    config: StreamConfig,
    mut trainer: Option<SpeedTrainer>,
) -> RenderedClicks {
    let clock = ManualClock::new(0.0);
    let renderer = OfflineRenderer::new(config, waveform, 0.0);
    let mut scheduler = BeatScheduler::new(clock.clone(), renderer, tempo);
    if let Some(trainer) = &trainer {
        scheduler.set_bpm(trainer.current_bpm());
    }
    scheduler.start();
    // The last poll covers ticks up to `seconds`.
    drive(
        &mut scheduler,
        &clock,
        (seconds - SCHEDULE_AHEAD_SECONDS).max(0.0),
        trainer.as_mut(),
    );
    scheduler.stop();

    let final_bpm = scheduler.bpm();
    let mut renderer = scheduler.into_sink();
    renderer.fit_to(seconds);
    let clicks = renderer.clicks();
    let samples = renderer.interleaved();
    info!(clicks, final_bpm, seconds, "rendered metronome track");
    RenderedClicks {
        samples,
        config,
        clicks,
        final_bpm,
    }
}

/// Polls on the look-ahead cadence until the clock reaches `until`. The
/// clock only moves forward and stops exactly at `until`; the trainer is fed
/// the same elapsed time as the clock.
fn drive<S: ClickSink>(
    scheduler: &mut BeatScheduler<ManualClock, S>,
    clock: &ManualClock,
    until: f64,
    mut trainer: Option<&mut SpeedTrainer>,
) {
    let step = LOOKAHEAD_INTERVAL.as_secs_f64();
    while clock.now() < until {
        scheduler.poll();
        let elapsed = step.min(until - clock.now());
        clock.advance(elapsed);
        if let Some(trainer) = trainer.as_deref_mut() {
            for event in trainer.advance(time::Duration::seconds_f64(elapsed)) {
                if let SpeedTrainerEvent::Step { bpm, .. } = event {
                    scheduler.set_bpm(bpm);
                }
            }
        }
    }
    scheduler.poll();
}

/// Writes interleaved 32-bit float PCM.
pub fn write_wav(path: &Path, samples: &[f32], config: StreamConfig) -> Result<()> {
    let spec = hound::WavSpec {
        channels: config.channels.max(1),
        sample_rate: config.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("create wav file {}", path.display()))?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}
