mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use fretwork_audio::{
    AudioDecoder, LogSink, StreamConfig, TimedReading, Tuner, DEFAULT_FRAME_SIZE,
};
use fretwork_domain::{
    frequency_from_midi, load_settings, note_from_frequency, PracticeSettings, TimeSignature,
    TunerSettings, Waveform,
};
use fretwork_metronome::{BeatScheduler, MetronomeRunner, SpeedTrainer, TapTempo, TokioClock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tuner, metronome and tap tempo for guitar practice", long_about = None)]
struct Cli {
    /// Settings file (JSON or YAML) supplying defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the notes played in an audio file
    Tune {
        input: PathBuf,
        /// Reference frequency of A4 in Hz
        #[arg(long)]
        a4: Option<f32>,
        #[arg(long, default_value_t = DEFAULT_FRAME_SIZE)]
        frame_size: usize,
        /// Print readings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the metronome, or render it to a WAV file
    Click(ClickArgs),
    /// Estimate a tempo from tap times in milliseconds
    Tap {
        #[arg(required = true)]
        taps_ms: Vec<f64>,
    },
    /// Name the note nearest to a frequency
    Note {
        frequency: f32,
        #[arg(long)]
        a4: Option<f32>,
    },
}

#[derive(Args, Debug)]
struct ClickArgs {
    #[arg(short, long)]
    bpm: Option<u32>,
    /// Time signature such as 3/4 or 6/8
    #[arg(short, long)]
    signature: Option<TimeSignature>,
    #[arg(long)]
    subdivisions: Option<u32>,
    #[arg(long)]
    no_accent: bool,
    /// Click waveform: sine, square, triangle or sawtooth
    #[arg(long)]
    sound: Option<Waveform>,
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Render to this WAV file instead of running in real time
    #[arg(long)]
    wav: Option<PathBuf>,
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,
    /// Channels written to the WAV file, each carrying the same clicks
    #[arg(long, default_value_t = 1)]
    channels: u16,
    /// Ramp the tempo using the configured speed trainer
    #[arg(long)]
    speed_trainer: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => PracticeSettings::default(),
    };

    match cli.command {
        Command::Tune {
            input,
            a4,
            frame_size,
            json,
        } => tune(&settings, input, a4, frame_size, json),
        Command::Click(args) => click(&settings, args).await,
        Command::Tap { taps_ms } => {
            tap(&taps_ms);
            Ok(())
        }
        Command::Note { frequency, a4 } => note(&settings, frequency, a4),
    }
}

fn tuner_settings(settings: &PracticeSettings, a4: Option<f32>) -> Result<TunerSettings> {
    Ok(match a4 {
        Some(a4) => TunerSettings::new(a4)?,
        None => settings.tuner.clone(),
    })
}

fn tune(
    settings: &PracticeSettings,
    input: PathBuf,
    a4: Option<f32>,
    frame_size: usize,
    json: bool,
) -> Result<()> {
    let tuner = Tuner::new(tuner_settings(settings, a4)?)?;
    let audio = AudioDecoder::open_mono(&input)?;
    let readings = tuner.scan(&audio.samples, audio.sample_rate as f32, frame_size)?;
    info!(
        frames = readings.len(),
        seconds = audio.duration_seconds(),
        "analyzed recording"
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else {
        for timed in &readings {
            println!("{}", describe_reading(timed));
        }
    }
    Ok(())
}

fn describe_reading(timed: &TimedReading) -> String {
    let estimate = &timed.reading.estimate;
    format!(
        "{:>7.2}s  {:<4} {:>8.2} Hz  {:>+6.1} cents{}",
        timed.start_seconds,
        estimate.label(),
        timed.reading.frequency_hz,
        estimate.detune_cents,
        if estimate.is_in_tune() { "  in tune" } else { "" }
    )
}

async fn click(settings: &PracticeSettings, args: ClickArgs) -> Result<()> {
    ensure!(
        args.seconds.is_finite() && args.seconds > 0.0,
        "duration must be a positive number of seconds"
    );
    let mut metronome = settings.metronome.clone();
    if let Some(bpm) = args.bpm {
        metronome.bpm = bpm;
    }
    if let Some(signature) = args.signature {
        metronome.time_signature = signature;
    }
    if let Some(subdivisions) = args.subdivisions {
        metronome.subdivision = subdivisions;
    }
    if let Some(sound) = args.sound {
        metronome.sound = sound;
    }
    if args.no_accent {
        metronome.accent = false;
    }
    let tempo = metronome.tempo_state()?;
    let trainer = if args.speed_trainer {
        Some(SpeedTrainer::new(settings.speed_trainer.clone())?)
    } else {
        None
    };

    if let Some(path) = args.wav {
        ensure!(args.channels > 0, "at least one output channel is required");
        let config = StreamConfig {
            sample_rate: args.sample_rate,
            channels: args.channels,
        };
        let rendered = render::render_clicks(tempo, metronome.sound, args.seconds, config, trainer);
        render::write_wav(&path, &rendered.samples, rendered.config)?;
        println!(
            "wrote {} clicks to {} (final tempo {} bpm)",
            rendered.clicks,
            path.display(),
            rendered.final_bpm
        );
        return Ok(());
    }

    let scheduler = BeatScheduler::new(TokioClock::new(), LogSink, tempo);
    let mut runner = MetronomeRunner::new(scheduler);
    if let Some(trainer) = trainer {
        runner = runner.with_speed_trainer(trainer);
    }
    let summary = runner
        .run_until(tokio::time::sleep(Duration::from_secs_f64(args.seconds)))
        .await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn tap(taps_ms: &[f64]) {
    let mut taps = TapTempo::new();
    for &at in taps_ms {
        match taps.record_tap(at) {
            Some(bpm) => println!("{at:>10.1} ms  {bpm} bpm"),
            None => println!("{at:>10.1} ms  -"),
        }
    }
}

fn note(settings: &PracticeSettings, frequency: f32, a4: Option<f32>) -> Result<()> {
    let reference = tuner_settings(settings, a4)?.a4;
    let estimate = note_from_frequency(frequency, reference)
        .with_context(|| format!("{frequency} Hz is not a positive, finite frequency"))?;
    println!(
        "{}  ({:.2} Hz)  {:+.1} cents  needle {:+.0} deg{}",
        estimate.label(),
        frequency_from_midi(estimate.midi, reference),
        estimate.detune_cents,
        estimate.needle_degrees(),
        if estimate.is_in_tune() { "  in tune" } else { "" }
    );
    Ok(())
}
