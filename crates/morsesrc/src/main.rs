mod device;
mod recording;
mod sink;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use crossbeam_channel::{unbounded, Receiver, Sender};
use morsesrc_engine::config::{DEFAULT_FREQUENCY_HZ, DEFAULT_VOLUME, DEFAULT_WPM};
use morsesrc_engine::{
    AudioInfo, AudioSource, Chunk, EngineEvent, LifecycleState, MorseEngine, WireFormat,
    DEFAULT_CHUNK_SAMPLES,
};
use tracing_subscriber::EnvFilter;

use crate::device::DevicePlayer;
use crate::recording::OggRecorder;
use crate::sink::Sink;

const DEFAULT_FORMAT: &str = "S16";
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "morsesrc", about = "Render text as Morse code audio")]
#[command(group(ArgGroup::new("sink").required(true).args(["output", "ogg", "play"])))]
struct Args {
    /// Text to send. Defaults to "OK".
    text: Option<String>,

    /// Tone frequency in Hz (400-2000).
    #[arg(long, default_value_t = DEFAULT_FREQUENCY_HZ)]
    frequency: f64,

    /// Tone amplitude (0-1).
    #[arg(long, default_value_t = DEFAULT_VOLUME)]
    volume: f64,

    /// Keying speed in words per minute (5-30).
    #[arg(long, default_value_t = DEFAULT_WPM)]
    wpm: u32,

    /// Send the text once, then stop.
    #[arg(long)]
    one_shot: bool,

    /// Wire format for raw output, e.g. S16LE, U24BE or F32.
    #[arg(long, default_value = DEFAULT_FORMAT)]
    format: String,

    /// Sample rate in Hz.
    #[arg(long, default_value_t = 44_100)]
    rate: u32,

    #[arg(long, default_value_t = 1)]
    channels: u16,

    /// Frames requested per chunk.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SAMPLES)]
    chunk_samples: usize,

    /// Write raw interleaved PCM to a file, or `-` for stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write an Ogg Opus recording.
    #[arg(long)]
    ogg: Option<PathBuf>,

    /// Play on an audio output device.
    #[arg(long)]
    play: bool,

    /// Regex selecting the output device by name.
    #[arg(long, requires = "play")]
    device: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (mut sink, info) = open_sink(&args)?;

    let (event_tx, event_rx) = unbounded();
    let mut builder = MorseEngine::builder(event_tx)
        .frequency_hz(args.frequency)
        .volume(args.volume)
        .wpm(args.wpm)
        .one_shot(args.one_shot);
    if let Some(text) = &args.text {
        builder = builder.text(text);
    }
    let mut engine = builder.build();
    let control = engine.controller();

    let (teardown_tx, teardown_rx) = unbounded();
    let watcher = thread::spawn(move || watch_events(event_rx, teardown_tx));

    engine.negotiate_format(info)?;
    control.set_lifecycle_state(LifecycleState::Ready);
    engine.start();
    control.set_lifecycle_state(LifecycleState::Playing);
    tracing::info!(
        text = %control.text(),
        format = %info.format,
        rate = info.rate,
        channels = info.channels,
        duration = ?engine.plan_duration(),
        "sending"
    );

    let result = run(&mut engine, &mut sink, &teardown_rx, args.chunk_samples);
    control.set_lifecycle_state(LifecycleState::Null);

    // Dropping the engine closes the notification channel.
    drop(engine);
    if watcher.join().is_err() {
        tracing::warn!("notification thread panicked");
    }

    result?;
    sink.finish()
}

fn open_sink(args: &Args) -> Result<(Sink, AudioInfo)> {
    if let Some(path) = &args.output {
        let format = WireFormat::from_name(&args.format)?;
        let info = AudioInfo::new(format, args.rate, args.channels)?;
        return Ok((Sink::raw(path)?, info));
    }

    if !args.format.eq_ignore_ascii_case(DEFAULT_FORMAT) {
        tracing::warn!(format = %args.format, "format only applies to raw output, using F32");
    }

    if let Some(path) = &args.ogg {
        let recorder = OggRecorder::new(path, args.rate, args.channels)?;
        let info = AudioInfo::new(WireFormat::native_f32(), args.rate, args.channels)?;
        return Ok((Sink::Ogg(recorder), info));
    }

    let player = DevicePlayer::open(args.device.as_deref())?;
    let info = AudioInfo::new(WireFormat::native_f32(), player.rate(), player.channels())?;
    Ok((Sink::Device(player), info))
}

/// Pull chunks until the stream ends or one-shot playback asks for teardown.
fn run(
    engine: &mut MorseEngine,
    sink: &mut Sink,
    teardown: &Receiver<()>,
    chunk_samples: usize,
) -> Result<()> {
    let mut frames = 0usize;
    loop {
        match engine.produce_chunk(chunk_samples)? {
            Chunk::Data(buffer) => {
                frames += buffer.frames;
                sink.write(&buffer)?;
            }
            Chunk::EndOfStream => {
                tracing::debug!("end of stream");
                break;
            }
            Chunk::Exceptional => {
                if teardown.recv_timeout(TEARDOWN_TIMEOUT).is_err() {
                    tracing::warn!("playback complete without a teardown request");
                }
                break;
            }
        }
    }

    engine.stop();
    tracing::info!(frames, "done");
    Ok(())
}

fn watch_events(events: Receiver<EngineEvent>, teardown: Sender<()>) {
    for event in events {
        tracing::info!(?event, "engine notification");
        if event == EngineEvent::RequestReady && teardown.send(()).is_err() {
            tracing::debug!("pull loop already finished, dropping teardown request");
        }
    }
}
