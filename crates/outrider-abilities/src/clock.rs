//! Effect clock: the only time source abilities read.

use serde::{Deserialize, Serialize};

/// Frame-relative time. Variable frames drive ability state and rewind
/// playback; fixed ticks drive history recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectClock {
    now: f64,
    delta: f64,
    fixed_delta: f64,
    frame: u64,
    fixed_tick: u64,
}

impl EffectClock {
    pub fn new(fixed_delta: f64) -> Self {
        Self {
            now: 0.0,
            delta: 0.0,
            fixed_delta,
            frame: 0,
            fixed_tick: 0,
        }
    }

    /// Start a new variable frame lasting `dt` seconds. Negative deltas count as zero.
    pub fn advance(&mut self, dt: f64) {
        self.delta = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.now += self.delta;
        self.frame += 1;
    }

    /// Count one fixed tick.
    pub fn advance_fixed(&mut self) {
        self.fixed_tick += 1;
    }

    /// Seconds since the clock started.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Length of the current variable frame.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn fixed_delta(&self) -> f64 {
        self.fixed_delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn fixed_tick(&self) -> u64 {
        self.fixed_tick
    }

    /// Seconds elapsed since `stamp`, never negative.
    pub fn since(&self, stamp: f64) -> f64 {
        (self.now - stamp).max(0.0)
    }
}

impl Default for EffectClock {
    fn default() -> Self {
        Self::new(outrider_core::constants::FIXED_DT)
    }
}
