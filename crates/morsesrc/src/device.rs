use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use morsesrc_engine::AudioBuffer;
use regex::Regex;
use ringbuf::HeapRb;

const OUTPUT_RING_SECONDS: usize = 4;
const DRAIN_MARGIN: Duration = Duration::from_millis(250);

/// Plays rendered chunks on an output device. The engine is negotiated to
/// the device's own rate and channel count in native f32, so chunks are
/// queued without conversion.
pub struct DevicePlayer {
    _stream: cpal::Stream,
    tx: Sender<Vec<f32>>,
    rate: u32,
    channels: u16,
    queued: Duration,
    started: Option<Instant>,
}

impl DevicePlayer {
    pub fn open(device_regex: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = select_output_device(&host, device_regex)?;
        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        if sample_format != cpal::SampleFormat::F32 {
            bail!("unsupported sample format {sample_format:?} (expected f32)");
        }
        let config: cpal::StreamConfig = config.into();
        let rate = config.sample_rate.0;
        let channels = config.channels;
        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            rate,
            channels,
            "opened output device"
        );

        let (tx, rx) = mpsc::channel();
        let ring_cap = rate as usize * channels as usize * OUTPUT_RING_SECONDS;
        let stream = build_output_stream(&device, &config, rx, ring_cap)?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            tx,
            rate,
            channels,
            queued: Duration::ZERO,
            started: None,
        })
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn play(&mut self, buffer: &AudioBuffer) -> Result<()> {
        let samples: Vec<f32> = buffer
            .data
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        self.started.get_or_insert_with(Instant::now);
        self.queued += buffer.duration;
        self.tx
            .send(samples)
            .map_err(|_| anyhow!("audio output stream closed"))
    }

    /// Block until everything queued has been played.
    pub fn drain(self) {
        if let Some(started) = self.started {
            let remaining = self.queued.saturating_sub(started.elapsed());
            tracing::debug!(?remaining, "waiting for output to drain");
            std::thread::sleep(remaining + DRAIN_MARGIN);
        }
    }
}

fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<Vec<f32>>,
    ring_cap: usize,
) -> Result<cpal::Stream> {
    let ring = HeapRb::<f32>::new(ring_cap);
    let (mut producer, mut consumer) = ring.split();
    let mut pending: VecDeque<f32> = VecDeque::new();

    let err_fn = |err| tracing::error!(%err, "audio stream error");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _| {
            while let Ok(chunk) = rx.try_recv() {
                pending.extend(chunk);
            }

            while let Some(sample) = pending.front().copied() {
                if producer.push(sample).is_ok() {
                    pending.pop_front();
                } else {
                    break;
                }
            }

            for out in data.iter_mut() {
                *out = consumer.pop().unwrap_or(0.0);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn select_output_device(host: &cpal::Host, device_regex: Option<&str>) -> Result<cpal::Device> {
    if let Some(pattern) = device_regex {
        let re = Regex::new(pattern)?;
        for dev in host.output_devices()? {
            let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
            if re.is_match(&name) {
                return Ok(dev);
            }
        }
        bail!("no output device matched regex {pattern:?}");
    }

    host.default_output_device()
        .ok_or_else(|| anyhow!("no default output device available"))
}
