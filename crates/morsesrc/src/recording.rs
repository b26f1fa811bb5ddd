use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use morsesrc_engine::AudioBuffer;
use ogg::writing::PacketWriteEndInfo;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Input rates the Opus encoder accepts.
pub const OPUS_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];

/// Ogg Opus granule positions always count 48 kHz samples.
const GRANULE_RATE: u64 = 48_000;
const FRAMES_PER_SECOND: u32 = 50;
const MAX_PACKET_BYTES: usize = 4_000;

/// Collects native f32 chunks and writes them as an Ogg Opus file on finish.
pub struct OggRecorder {
    path: PathBuf,
    rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl OggRecorder {
    pub fn new(path: &Path, rate: u32, channels: u16) -> Result<Self> {
        if !OPUS_RATES.contains(&rate) {
            bail!("Ogg Opus recording needs one of {OPUS_RATES:?} Hz, got {rate} Hz");
        }
        if !(1..=2).contains(&channels) {
            bail!("Ogg Opus recording supports 1 or 2 channels, got {channels}");
        }
        Ok(Self {
            path: path.to_path_buf(),
            rate,
            channels,
            samples: Vec::new(),
        })
    }

    pub fn push(&mut self, buffer: &AudioBuffer) {
        self.samples.extend(
            buffer
                .data
                .chunks_exact(4)
                .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
        );
    }

    pub fn finish(self) -> Result<PathBuf> {
        write_recording(&self.path, self.rate, self.channels, &self.samples)
            .with_context(|| format!("writing {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "recording written");
        Ok(self.path)
    }
}

fn write_recording(path: &Path, rate: u32, channels: u16, samples: &[f32]) -> Result<()> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let serial = (now.as_secs() as u32).wrapping_add(now.subsec_nanos());
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| format!("{}.{}", now.as_secs(), now.subsec_nanos()));

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let mut ogg = ogg::writing::PacketWriter::new(&mut writer);

    let opus_channels = if channels == 2 {
        opus::Channels::Stereo
    } else {
        opus::Channels::Mono
    };
    let mut encoder = opus::Encoder::new(rate, opus_channels, opus::Application::Audio)?;

    let head = build_opus_head(rate, channels as u8, 0);
    ogg.write_packet(head.into_boxed_slice(), serial, PacketWriteEndInfo::EndPage, 0)?;
    let tags = build_opus_tags("morsesrc", &timestamp);
    ogg.write_packet(tags.into_boxed_slice(), serial, PacketWriteEndInfo::EndPage, 0)?;

    let frame_len = (rate / FRAMES_PER_SECOND) as usize * channels as usize;
    let total_frames = samples.len() / channels as usize;
    let mut frame = vec![0f32; frame_len];
    let mut out = vec![0u8; MAX_PACKET_BYTES];
    let mut gp: u64 = 0;
    let mut pos = 0usize;

    // An empty recording still gets one (silent) packet to end the stream.
    loop {
        let take = (samples.len() - pos).min(frame_len);
        frame.fill(0.0);
        frame[..take].copy_from_slice(&samples[pos..pos + take]);
        let encoded = encoder.encode_float(&frame, &mut out)?;
        pos += take;
        gp += GRANULE_RATE / FRAMES_PER_SECOND as u64;

        let is_last = pos >= samples.len();
        let (info, granule) = if is_last {
            (
                PacketWriteEndInfo::EndStream,
                granule_position(total_frames, rate).min(gp),
            )
        } else {
            (PacketWriteEndInfo::NormalPacket, gp)
        };
        ogg.write_packet(out[..encoded].to_vec().into_boxed_slice(), serial, info, granule)?;
        if is_last {
            break;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Granule position after `frames` frames at `rate`.
fn granule_position(frames: usize, rate: u32) -> u64 {
    frames as u64 * GRANULE_RATE / rate as u64
}

fn build_opus_head(sample_rate_hz: u32, channels: u8, preskip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1);
    head.push(channels);
    head.extend_from_slice(&preskip.to_le_bytes());
    head.extend_from_slice(&sample_rate_hz.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes());
    head.push(0);
    head
}

fn build_opus_tags(vendor: &str, timestamp: &str) -> Vec<u8> {
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor.as_bytes());
    tags.extend_from_slice(&1u32.to_le_bytes());
    let comment = format!("TIMESTAMP={timestamp}");
    tags.extend_from_slice(&(comment.len() as u32).to_le_bytes());
    tags.extend_from_slice(comment.as_bytes());
    tags
}
