//! Face stability accumulator.
//!
//! Presence samples raise the counter by one, absences drop it by two, so a
//! lost face registers faster than a found one. The face counts as stable
//! once the counter reaches the threshold.

use checkpoint_common::StabilityState;
use checkpoint_common::constants::stability::{DECAY, GAIN, MAX};

/// Debounces the boolean presence stream
#[derive(Debug, Default)]
pub struct StabilityAccumulator {
    counter: u8,
}

impl StabilityAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_sample(&mut self, present: bool) {
        self.counter = if present {
            self.counter.saturating_add(GAIN).min(MAX)
        } else {
            self.counter.saturating_sub(DECAY)
        };
    }

    pub fn read(&self) -> StabilityState {
        StabilityState::new(self.counter)
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
