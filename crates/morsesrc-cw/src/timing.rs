use crate::encode::Unit;

/// Shortest dot the synthesizer will render, in samples.
pub const MIN_SAMPLES_PER_DOT: usize = 100;

/// Per-unit durations derived from keying speed and sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub samples_per_dot: usize,
    pub samples_per_dash: usize,
    pub samples_per_gap: usize,
}

impl Timing {
    /// Derive unit durations. A dot lasts `1.2 / wpm` seconds and is never
    /// shorter than [`MIN_SAMPLES_PER_DOT`].
    pub fn new(wpm: u32, sample_rate_hz: u32) -> Self {
        let dot_seconds = 1.2 / wpm.max(1) as f64;
        let exact = (dot_seconds * sample_rate_hz as f64).round() as usize;
        if exact < MIN_SAMPLES_PER_DOT {
            tracing::warn!(
                wpm,
                sample_rate_hz,
                samples = exact,
                "dot duration too short, using minimum"
            );
        }
        let samples_per_dot = exact.max(MIN_SAMPLES_PER_DOT);

        Self {
            samples_per_dot,
            samples_per_dash: samples_per_dot * 3,
            samples_per_gap: samples_per_dot,
        }
    }

    /// Nominal duration of a unit in samples.
    pub fn unit_samples(&self, unit: Unit) -> usize {
        match unit {
            Unit::Dot => self.samples_per_dot,
            Unit::Dash => self.samples_per_dash,
            Unit::Gap => self.samples_per_gap,
        }
    }

    /// Nominal duration of a whole sequence of units in samples.
    pub fn total_samples(&self, units: &[Unit]) -> usize {
        units.iter().map(|unit| self.unit_samples(*unit)).sum()
    }
}
