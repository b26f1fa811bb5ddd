pub mod encode;
pub mod modulator;
mod sine_oscillator;
pub mod table;
pub mod timing;

pub use encode::{compile, RenderPlan, Unit, TRAILING_GAPS};
pub use modulator::{CwModulator, Sample, SampleBuffer, SampleEncoding};
pub use sine_oscillator::SineOscillator;
pub use timing::Timing;
