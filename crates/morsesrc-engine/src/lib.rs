pub mod completion;
pub mod config;
pub mod engine;
mod error;
pub mod events;
pub mod format;
pub mod pending;
pub mod renderer;

pub use config::EngineConfig;
pub use engine::{AudioSource, EngineController, LifecycleState, MorseEngine, MorseEngineBuilder};
pub use error::{EngineError, FormatError};
pub use events::{EngineEvent, HostNotifier, NullNotifier};
pub use format::{AudioInfo, WireFormat};
pub use renderer::{AudioBuffer, Chunk, DEFAULT_CHUNK_SAMPLES};

pub use crossbeam_channel;
