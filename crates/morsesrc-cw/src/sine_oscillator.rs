use std::f64::consts::TAU;

/// Phase-continuous sine oscillator. Phase is kept in radians in `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineOscillator {
    phase: f64,
    phase_inc: f64,
}

impl SineOscillator {
    pub fn new(sample_rate_hz: u32, tone_freq_hz: f64) -> Self {
        Self::with_phase(sample_rate_hz, tone_freq_hz, 0.0)
    }

    /// Resume an oscillator at a previously saved phase.
    pub fn with_phase(sample_rate_hz: u32, tone_freq_hz: f64, phase: f64) -> Self {
        Self {
            phase: phase.rem_euclid(TAU),
            phase_inc: TAU * tone_freq_hz / sample_rate_hz.max(1) as f64,
        }
    }

    pub fn next(&mut self) -> f64 {
        let value = self.phase.sin();
        self.advance(1);
        value
    }

    pub fn advance(&mut self, samples: usize) {
        if samples == 0 {
            return;
        }
        self.phase += self.phase_inc * samples as f64;
        if self.phase >= TAU {
            self.phase %= TAU;
        }
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn phase_inc(&self) -> f64 {
        self.phase_inc
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
