//! The engine object shared between a control handle and the render side.
//!
//! All mutable state lives in one [`Shared`] behind a single mutex. The
//! render side holds that lock only to copy small values in and out; plan
//! compilation and sample synthesis run unlocked. Notifications are posted
//! after the lock is released.

use std::sync::Arc;
use std::time::Duration;

use morsesrc_cw::{compile, RenderPlan, Timing};
use parking_lot::Mutex;

use crate::completion::{Completion, Exhausted};
use crate::config::{EngineConfig, DEFAULT_TEXT};
use crate::error::EngineError;
use crate::events::{EngineEvent, HostNotifier};
use crate::format::AudioInfo;
use crate::pending::PendingText;
use crate::renderer::{
    frames_to_duration, Chunk, ChunkRenderer, Cursor, ToneSettings, DEFAULT_CHUNK_SAMPLES,
};

/// Lifecycle state reported by the host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Null,
    Ready,
    Paused,
    Playing,
}

/// What a host drives. The host adapter binds this to its own plugin ABI.
pub trait AudioSource {
    /// Accept an output format. Must succeed before the first chunk.
    fn negotiate_format(&mut self, info: AudioInfo) -> Result<(), EngineError>;

    /// Compile the current text and rewind to the start.
    fn start(&mut self);

    /// Drop the active plan and return to idle.
    fn stop(&mut self);

    /// Produce up to `max_samples` frames, or report the end of the stream.
    fn produce_chunk(&mut self, max_samples: usize) -> Result<Chunk, EngineError>;
}

#[derive(Debug)]
struct Shared {
    config: EngineConfig,
    rate: Option<u32>,
    timing: Option<Timing>,
    text: String,
    pending: PendingText,
    /// `None` while idle.
    plan: Option<RenderPlan>,
    cursor: Cursor,
    completion: Completion,
    lifecycle: LifecycleState,
}

impl Shared {
    fn recompute_timing(&mut self) {
        if let Some(rate) = self.rate {
            self.timing = Some(Timing::new(self.config.wpm(), rate));
        }
    }

    fn install(&mut self, text: String, plan: RenderPlan) {
        self.text = text;
        self.plan = Some(plan);
        self.cursor = Cursor::default();
        self.completion.reset();
    }
}

/// Builder for [`MorseEngine`].
pub struct MorseEngineBuilder {
    notifier: Arc<dyn HostNotifier>,
    config: EngineConfig,
    text: String,
}

impl MorseEngineBuilder {
    fn new(notifier: Arc<dyn HostNotifier>) -> Self {
        Self {
            notifier,
            config: EngineConfig::default(),
            text: DEFAULT_TEXT.to_string(),
        }
    }

    /// Set the initial text. Empty text is ignored.
    pub fn text(mut self, text: &str) -> Self {
        if text.is_empty() {
            tracing::warn!("empty text provided, ignoring");
        } else {
            self.text = text.to_string();
        }
        self
    }

    pub fn frequency_hz(mut self, hz: f64) -> Self {
        self.config.set_frequency_hz(hz);
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.config.set_volume(volume);
        self
    }

    pub fn wpm(mut self, wpm: u32) -> Self {
        self.config.set_wpm(wpm);
        self
    }

    pub fn one_shot(mut self, one_shot: bool) -> Self {
        self.config.set_one_shot(one_shot);
        self
    }

    pub fn build(self) -> MorseEngine {
        let shared = Shared {
            config: self.config,
            rate: None,
            timing: None,
            text: self.text,
            pending: PendingText::default(),
            plan: None,
            cursor: Cursor::default(),
            completion: Completion::default(),
            lifecycle: LifecycleState::default(),
        };

        MorseEngine {
            shared: Arc::new(Mutex::new(shared)),
            notifier: self.notifier,
            renderer: None,
        }
    }
}

/// Text-to-Morse audio source. Owned by the render actor; control goes
/// through [`EngineController`] handles.
pub struct MorseEngine {
    shared: Arc<Mutex<Shared>>,
    notifier: Arc<dyn HostNotifier>,
    renderer: Option<ChunkRenderer>,
}

impl MorseEngine {
    pub fn builder<N: HostNotifier + 'static>(notifier: N) -> MorseEngineBuilder {
        MorseEngineBuilder::new(Arc::new(notifier))
    }

    /// A control handle that may be used from any thread.
    pub fn controller(&self) -> EngineController {
        EngineController {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn audio_info(&self) -> Option<AudioInfo> {
        self.renderer.as_ref().map(|renderer| *renderer.info())
    }

    /// Nominal duration of the active plan, once a rate is negotiated.
    pub fn plan_duration(&self) -> Option<Duration> {
        let shared = self.shared.lock();
        let (plan, timing, rate) = (shared.plan.as_ref()?, shared.timing?, shared.rate?);
        Some(frames_to_duration(timing.total_samples(plan.units()), rate))
    }

    /// Replace the active plan with the pending text, if any. Returns the
    /// length in frames of the silent settle tick to emit before the new
    /// plan starts.
    fn apply_pending(&self) -> Option<usize> {
        let text = {
            let mut shared = self.shared.lock();
            if shared.plan.is_none() {
                return None;
            }
            shared.pending.take()?
        };

        let plan = compile(&text);

        let (settle, was_playing) = {
            let mut shared = self.shared.lock();
            let was_playing = shared.lifecycle == LifecycleState::Playing;
            tracing::debug!(text = %text, units = plan.len(), was_playing, "applying new text");
            shared.install(text, plan);

            let settle = shared.timing.zip(shared.rate).map(|(timing, rate)| {
                let frames = timing.samples_per_dot;
                (frames, frames_to_duration(frames, rate))
            });
            if let Some((_, duration)) = settle {
                shared.cursor.timestamp = duration;
            }
            (settle, was_playing)
        };

        if was_playing {
            self.notifier.notify(EngineEvent::NewSegment);
        }
        self.notifier.notify(EngineEvent::DurationChanged);
        settle.map(|(frames, _)| frames)
    }
}

impl AudioSource for MorseEngine {
    fn negotiate_format(&mut self, info: AudioInfo) -> Result<(), EngineError> {
        let info = AudioInfo::new(info.format, info.rate, info.channels)?;
        tracing::debug!(
            format = %info.format,
            rate = info.rate,
            channels = info.channels,
            "negotiated output format"
        );

        {
            let mut shared = self.shared.lock();
            shared.rate = Some(info.rate);
            shared.recompute_timing();
            shared.cursor.phase = 0.0;
        }

        self.renderer = Some(ChunkRenderer::new(info));
        Ok(())
    }

    fn start(&mut self) {
        let text = {
            let mut shared = self.shared.lock();
            let text = match shared.pending.take() {
                Some(text) => text,
                None => shared.text.clone(),
            };
            if text.is_empty() {
                tracing::warn!("no text provided, using default");
                DEFAULT_TEXT.to_string()
            } else {
                text
            }
        };

        let plan = compile(&text);
        tracing::debug!(text = %text, units = plan.len(), "starting");

        let mut shared = self.shared.lock();
        shared.install(text, plan);
    }

    fn stop(&mut self) {
        let mut shared = self.shared.lock();
        tracing::debug!(position = shared.cursor.position, "stopping");
        shared.plan = None;
        shared.cursor = Cursor::default();
        shared.completion.reset();
    }

    fn produce_chunk(&mut self, max_samples: usize) -> Result<Chunk, EngineError> {
        if self.renderer.is_none() {
            return Err(EngineError::NotNegotiated);
        }
        let max_frames = max_samples.clamp(1, DEFAULT_CHUNK_SAMPLES);

        if let Some(frames) = self.apply_pending() {
            let Some(renderer) = self.renderer.as_mut() else {
                return Err(EngineError::NotNegotiated);
            };
            renderer.silence(frames);
            return Ok(Chunk::Data(renderer.finish(frames, Duration::ZERO)));
        }

        let (plan, mut cursor, timing, tone) = {
            let mut shared = self.shared.lock();
            let Some(plan) = shared.plan.clone() else {
                return Ok(Chunk::EndOfStream);
            };
            let Some(timing) = shared.timing else {
                return Err(EngineError::NotNegotiated);
            };

            if shared.cursor.position >= plan.len() {
                let one_shot = shared.config.one_shot();
                let outcome = shared.completion.exhausted(one_shot);
                drop(shared);

                return Ok(match outcome {
                    Exhausted::Complete => {
                        tracing::debug!("one-shot playback complete");
                        self.notifier.notify(EngineEvent::PlaybackComplete);
                        self.notifier.notify(EngineEvent::RequestReady);
                        Chunk::Exceptional
                    }
                    Exhausted::EndOfStream => Chunk::EndOfStream,
                });
            }

            let tone = ToneSettings {
                frequency_hz: shared.config.frequency_hz(),
                volume: shared.config.volume(),
            };
            (plan, shared.cursor, timing, tone)
        };

        let Some(renderer) = self.renderer.as_mut() else {
            return Err(EngineError::NotNegotiated);
        };
        let frames = renderer.fill(&plan, &mut cursor, &timing, tone, max_frames);
        let duration = frames_to_duration(frames, renderer.info().rate);

        // Only the render side moves the cursor, so it is written back whole.
        let pts = cursor.timestamp;
        let near_end = {
            let mut shared = self.shared.lock();
            shared.cursor = Cursor {
                timestamp: pts + duration,
                ..cursor
            };
            shared.completion.observe(cursor.position, plan.len())
        };

        if near_end {
            tracing::debug!(position = cursor.position, units = plan.len(), "about to finish");
            self.notifier.notify(EngineEvent::AboutToFinish);
        }

        tracing::trace!(frames, position = cursor.position, ?pts, "produced chunk");
        Ok(Chunk::Data(renderer.finish(frames, pts)))
    }
}

/// Control surface: configuration and text replacement. Cheap to clone and
/// safe to use concurrently with chunk production.
#[derive(Clone)]
pub struct EngineController {
    shared: Arc<Mutex<Shared>>,
}

impl EngineController {
    /// Queue `text` to replace the active text at the start of the next chunk.
    /// Empty text is ignored.
    pub fn set_text(&self, text: &str) {
        self.shared.lock().pending.request(text);
    }

    pub fn set_frequency(&self, hz: f64) {
        self.shared.lock().config.set_frequency_hz(hz);
    }

    pub fn set_volume(&self, volume: f64) {
        self.shared.lock().config.set_volume(volume);
    }

    /// Change keying speed; timing is recomputed immediately if a rate is
    /// known.
    pub fn set_wpm(&self, wpm: u32) {
        let mut shared = self.shared.lock();
        shared.config.set_wpm(wpm);
        shared.recompute_timing();
    }

    pub fn set_one_shot(&self, one_shot: bool) {
        self.shared.lock().config.set_one_shot(one_shot);
    }

    pub fn set_lifecycle_state(&self, state: LifecycleState) {
        self.shared.lock().lifecycle = state;
    }

    /// The active text. A pending replacement is not visible until applied.
    pub fn text(&self) -> String {
        self.shared.lock().text.clone()
    }

    pub fn frequency(&self) -> f64 {
        self.shared.lock().config.frequency_hz()
    }

    pub fn volume(&self) -> f64 {
        self.shared.lock().config.volume()
    }

    pub fn wpm(&self) -> u32 {
        self.shared.lock().config.wpm()
    }

    pub fn one_shot(&self) -> bool {
        self.shared.lock().config.one_shot()
    }

    pub fn timing(&self) -> Option<Timing> {
        self.shared.lock().timing
    }
}
