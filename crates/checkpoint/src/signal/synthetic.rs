//! Simulated face presence.

use checkpoint_common::constants::synthetic::{FRAMING_OK, LIGHTING_OK, STEADY_OK};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FaceSample, FaceSignalSource, SignalKind, SourcePoll};

/// Presence is the AND of three independently simulated capture conditions
pub struct SyntheticSource {
    rng: StdRng,
    lighting_ok: f64,
    framing_ok: f64,
    steady_ok: f64,
}

impl SyntheticSource {
    /// Seeded from the OS
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            lighting_ok: LIGHTING_OK,
            framing_ok: FRAMING_OK,
            steady_ok: STEADY_OK,
        }
    }

    /// Probability that a single sample reports presence
    pub fn presence_probability(&self) -> f64 {
        self.lighting_ok * self.framing_ok * self.steady_ok
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceSignalSource for SyntheticSource {
    fn next_sample(&mut self) -> SourcePoll {
        // Draw all three so every tick consumes the same amount of randomness
        let lighting = self.rng.random_bool(self.lighting_ok);
        let framing = self.rng.random_bool(self.framing_ok);
        let steady = self.rng.random_bool(self.steady_ok);

        SourcePoll::Sample(FaceSample {
            present: lighting && framing && steady,
        })
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Synthetic
    }
}
