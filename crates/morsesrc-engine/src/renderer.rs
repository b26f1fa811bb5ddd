//! Chunked rendering of a plan into wire-format buffers.

use std::time::Duration;

use morsesrc_cw::{CwModulator, RenderPlan, SampleBuffer, SineOscillator, Timing, Unit};

use crate::format::{pack, AudioInfo, WireFormat};

/// Upper bound on frames per chunk, whatever the sample rate.
pub const DEFAULT_CHUNK_SAMPLES: usize = 5_292 * 10;

/// Render state carried between chunks of the same plan.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Index of the next unit to render.
    pub position: usize,
    /// Oscillator phase in radians.
    pub phase: f64,
    /// Stream time of the next buffer.
    pub timestamp: Duration,
}

/// A block of audio in the negotiated wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub data: Vec<u8>,
    pub frames: usize,
    pub pts: Duration,
    pub duration: Duration,
    pub format: WireFormat,
    pub channels: u16,
}

/// Result of one pull.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Data(AudioBuffer),
    EndOfStream,
    /// One-shot playback finished; the stream stops without end-of-stream
    /// so the completion notification reaches the host first.
    Exceptional,
}

/// Stream duration of `frames` frames, truncated to whole nanoseconds.
pub fn frames_to_duration(frames: usize, rate: u32) -> Duration {
    let nanos = frames as u128 * 1_000_000_000 / rate.max(1) as u128;
    Duration::from_nanos(nanos as u64)
}

/// Tone parameters for one chunk, copied out of the shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSettings {
    pub frequency_hz: f64,
    pub volume: f64,
}

/// Owns the scratch buffer and modulator for a negotiated format. Lives on
/// the render side only.
pub struct ChunkRenderer {
    info: AudioInfo,
    modulator: CwModulator,
    scratch: SampleBuffer,
}

impl ChunkRenderer {
    pub fn new(info: AudioInfo) -> Self {
        let (encoding, _) = info.format.canonical();
        Self {
            info,
            modulator: CwModulator::new(info.rate, info.channels as usize),
            scratch: SampleBuffer::new(encoding),
        }
    }

    pub fn info(&self) -> &AudioInfo {
        &self.info
    }

    /// Render units from `cursor.position` until `max_frames` frames are
    /// filled or the plan runs out. Returns the number of frames written.
    ///
    /// A unit that does not fit is cut short and still counts as consumed.
    pub fn fill(
        &mut self,
        plan: &RenderPlan,
        cursor: &mut Cursor,
        timing: &Timing,
        tone: ToneSettings,
        max_frames: usize,
    ) -> usize {
        let channels = self.modulator.channels();
        let gap = timing.samples_per_gap;
        self.scratch.reset_silent(max_frames * channels);

        let mut osc = SineOscillator::with_phase(self.info.rate, tone.frequency_hz, cursor.phase);
        let mut offset = 0;

        while offset < max_frames {
            let Some(unit) = plan.get(cursor.position) else {
                break;
            };

            let frames = timing.unit_samples(unit).min(max_frames - offset);
            if unit != Unit::Gap {
                self.modulator
                    .render_tone(&mut osc, tone.volume, offset, frames, &mut self.scratch);
            }
            offset += frames;

            if frames < gap && gap < max_frames - offset {
                offset += gap - frames;
            }

            cursor.position += 1;
        }

        cursor.phase = osc.phase();
        self.scratch.truncate(offset * channels);
        offset
    }

    /// Fill `frames` frames of silence.
    pub fn silence(&mut self, frames: usize) {
        self.scratch.reset_silent(frames * self.modulator.channels());
    }

    /// Pack the last rendered block into a stamped buffer.
    pub fn finish(&self, frames: usize, pts: Duration) -> AudioBuffer {
        AudioBuffer {
            data: pack(&self.scratch, &self.info.format),
            frames,
            pts,
            duration: frames_to_duration(frames, self.info.rate),
            format: self.info.format,
            channels: self.info.channels,
        }
    }
}
