use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, instrument};

/// Decoded recording folded down to a single channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonoAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl MonoAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Averages interleaved frames into one channel.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Reads any container symphonia recognises into mono samples for the tuner.
pub struct AudioDecoder;

impl AudioDecoder {
    #[instrument]
    pub fn open_mono<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<MonoAudio> {
        let path = path.as_ref();
        let source = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let stream = MediaSourceStream::new(Box::new(source), Default::default());
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }
        let mut reader = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .with_context(|| format!("unsupported audio format in {}", path.display()))?
            .format;

        let track = reader
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .context("no decodable audio track")?;
        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(48_000);
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        let mut scratch: Option<SampleBuffer<f32>> = None;
        while let Some(packet) = next_packet(reader.as_mut())? {
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(reason)) => {
                    debug!(reason, "skipping undecodable packet");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let spec = *decoded.spec();
            let needed = decoded.capacity() * spec.channels.count();
            if scratch.as_ref().is_some_and(|buffer| buffer.capacity() < needed) {
                scratch = None;
            }
            let frames = decoded.capacity() as u64;
            let buffer = scratch.get_or_insert_with(|| SampleBuffer::new(frames, spec));
            buffer.copy_interleaved_ref(decoded);
            samples.extend(downmix(buffer.samples(), spec.channels.count()));
        }

        debug!(sample_rate, frames = samples.len(), "decoded audio");
        Ok(MonoAudio {
            sample_rate,
            samples,
        })
    }
}

/// Next packet, or `None` once the stream is exhausted.
fn next_packet(reader: &mut dyn FormatReader) -> Result<Option<Packet>> {
    match reader.next_packet() {
        Ok(packet) => Ok(Some(packet)),
        Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err.into()),
    }
}
