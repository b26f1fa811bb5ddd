use crate::sine_oscillator::SineOscillator;

/// Length of the anti-click ramp at each end of a tone burst, in seconds.
pub const FADE_SECONDS: f64 = 0.020;

/// A numeric sample type the synthesizer can render into directly.
pub trait Sample: Copy + Default + Send + 'static {
    /// Value of a full-scale positive peak.
    const FULL_SCALE: f64;

    fn from_f64(value: f64) -> Self;
}

impl Sample for i16 {
    const FULL_SCALE: f64 = 32_767.0;

    fn from_f64(value: f64) -> Self {
        value as i16
    }
}

impl Sample for i32 {
    const FULL_SCALE: f64 = 2_147_483_647.0;

    fn from_f64(value: f64) -> Self {
        value as i32
    }
}

impl Sample for f32 {
    const FULL_SCALE: f64 = 1.0;

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    const FULL_SCALE: f64 = 1.0;

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// The canonical in-memory encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    I16,
    I32,
    F32,
    F64,
}

/// Interleaved sample storage in one canonical encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl SampleBuffer {
    pub fn new(encoding: SampleEncoding) -> Self {
        match encoding {
            SampleEncoding::I16 => SampleBuffer::I16(Vec::new()),
            SampleEncoding::I32 => SampleBuffer::I32(Vec::new()),
            SampleEncoding::F32 => SampleBuffer::F32(Vec::new()),
            SampleEncoding::F64 => SampleBuffer::F64(Vec::new()),
        }
    }

    /// Number of individual samples (frames times channels).
    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::I16(v) => v.len(),
            SampleBuffer::I32(v) => v.len(),
            SampleBuffer::F32(v) => v.len(),
            SampleBuffer::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `len` samples, all silent.
    pub fn reset_silent(&mut self, len: usize) {
        match self {
            SampleBuffer::I16(v) => reset(v, len),
            SampleBuffer::I32(v) => reset(v, len),
            SampleBuffer::F32(v) => reset(v, len),
            SampleBuffer::F64(v) => reset(v, len),
        }
    }

    pub fn truncate(&mut self, len: usize) {
        match self {
            SampleBuffer::I16(v) => v.truncate(len),
            SampleBuffer::I32(v) => v.truncate(len),
            SampleBuffer::F32(v) => v.truncate(len),
            SampleBuffer::F64(v) => v.truncate(len),
        }
    }

    /// Native-endian bytes of the samples.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        match self {
            SampleBuffer::I16(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
            SampleBuffer::I32(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
            SampleBuffer::F32(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
            SampleBuffer::F64(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
        }
    }
}

fn reset<S: Sample>(samples: &mut Vec<S>, len: usize) {
    samples.clear();
    samples.resize(len, S::default());
}

/// Renders enveloped tone bursts into interleaved buffers.
pub struct CwModulator {
    channels: usize,
    fade_samples: usize,
}

impl CwModulator {
    /// Create a modulator for the given output rate and channel count.
    pub fn new(sample_rate_hz: u32, channels: usize) -> Self {
        Self {
            channels: channels.max(1),
            fade_samples: (FADE_SECONDS * sample_rate_hz as f64).round() as usize,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Ramp length for a burst of `frames` frames. Never more than half the
    /// burst, so fade-in and fade-out do not overlap.
    pub fn fade_frames(&self, frames: usize) -> usize {
        self.fade_samples.min(frames / 2)
    }

    /// Render `frames` frames of tone starting at frame `offset` of `out`.
    ///
    /// The oscillator advances one step per frame and keeps its phase for the
    /// next burst; only the envelope restarts.
    pub fn render_tone(
        &self,
        osc: &mut SineOscillator,
        volume: f64,
        offset: usize,
        frames: usize,
        out: &mut SampleBuffer,
    ) {
        let start = offset * self.channels;
        let end = (offset + frames) * self.channels;
        match out {
            SampleBuffer::I16(v) => self.fill(osc, volume, frames, &mut v[start..end]),
            SampleBuffer::I32(v) => self.fill(osc, volume, frames, &mut v[start..end]),
            SampleBuffer::F32(v) => self.fill(osc, volume, frames, &mut v[start..end]),
            SampleBuffer::F64(v) => self.fill(osc, volume, frames, &mut v[start..end]),
        }
    }

    fn fill<S: Sample>(
        &self,
        osc: &mut SineOscillator,
        volume: f64,
        frames: usize,
        out: &mut [S],
    ) {
        let fade = self.fade_frames(frames);
        let amplitude = volume * S::FULL_SCALE;

        for (i, frame) in out.chunks_exact_mut(self.channels).enumerate() {
            let envelope = if i < fade {
                i as f64 / fade as f64
            } else if i > frames - fade {
                (frames - i) as f64 / fade as f64
            } else {
                1.0
            };

            let sample = S::from_f64(amplitude * envelope * osc.next());
            frame.fill(sample);
        }
    }
}
