use std::ops::RangeInclusive;

pub const DEFAULT_FREQUENCY_HZ: f64 = 880.0;
pub const DEFAULT_VOLUME: f64 = 0.5;
pub const DEFAULT_WPM: u32 = 20;
pub const DEFAULT_TEXT: &str = "OK";

pub const FREQUENCY_RANGE_HZ: RangeInclusive<f64> = 400.0..=2_000.0;
pub const VOLUME_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const WPM_RANGE: RangeInclusive<u32> = 5..=30;

/// Tone and keying settings. Every setter clamps into the valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    frequency_hz: f64,
    volume: f64,
    wpm: u32,
    one_shot: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            volume: DEFAULT_VOLUME,
            wpm: DEFAULT_WPM,
            one_shot: false,
        }
    }
}

impl EngineConfig {
    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn one_shot(&self) -> bool {
        self.one_shot
    }

    pub fn set_frequency_hz(&mut self, hz: f64) {
        self.frequency_hz = clamp_f64("frequency", hz, FREQUENCY_RANGE_HZ);
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = clamp_f64("volume", volume, VOLUME_RANGE);
    }

    pub fn set_wpm(&mut self, wpm: u32) {
        let (min, max) = (*WPM_RANGE.start(), *WPM_RANGE.end());
        if !WPM_RANGE.contains(&wpm) {
            tracing::warn!(wpm, min, max, "wpm out of range, clamping");
        }
        self.wpm = wpm.clamp(min, max);
    }

    pub fn set_one_shot(&mut self, one_shot: bool) {
        self.one_shot = one_shot;
    }
}

fn clamp_f64(name: &str, value: f64, range: RangeInclusive<f64>) -> f64 {
    let (min, max) = (*range.start(), *range.end());
    if value.is_nan() {
        tracing::warn!(property = name, "value is NaN, using minimum");
        return min;
    }
    if !range.contains(&value) {
        tracing::warn!(property = name, value, min, max, "value out of range, clamping");
    }
    value.clamp(min, max)
}
