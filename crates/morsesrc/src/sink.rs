use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use morsesrc_engine::AudioBuffer;

use crate::device::DevicePlayer;
use crate::recording::OggRecorder;

/// Where produced chunks go.
pub enum Sink {
    Raw(RawWriter<Box<dyn Write>>),
    Ogg(OggRecorder),
    Device(DevicePlayer),
}

impl Sink {
    /// Raw PCM to `path`, or to stdout when `path` is `-`.
    pub fn raw(path: &Path) -> Result<Self> {
        let writer: Box<dyn Write> = if path == Path::new("-") {
            Box::new(BufWriter::new(io::stdout()))
        } else {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Box::new(BufWriter::new(file))
        };
        Ok(Sink::Raw(RawWriter::new(writer)))
    }

    pub fn write(&mut self, buffer: &AudioBuffer) -> Result<()> {
        match self {
            Sink::Raw(writer) => writer.write(buffer),
            Sink::Ogg(recorder) => {
                recorder.push(buffer);
                Ok(())
            }
            Sink::Device(player) => player.play(buffer),
        }
    }

    pub fn finish(self) -> Result<()> {
        match self {
            Sink::Raw(writer) => writer.finish(),
            Sink::Ogg(recorder) => recorder.finish().map(|_| ()),
            Sink::Device(player) => {
                player.drain();
                Ok(())
            }
        }
    }
}

/// Writes chunk payloads back to back, without any header.
pub struct RawWriter<W: Write> {
    inner: W,
    bytes: usize,
}

impl<W: Write> RawWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    pub fn write(&mut self, buffer: &AudioBuffer) -> Result<()> {
        self.inner.write_all(&buffer.data)?;
        self.bytes += buffer.data.len();
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.inner.flush()?;
        tracing::debug!(bytes = self.bytes, "raw output flushed");
        Ok(())
    }
}
