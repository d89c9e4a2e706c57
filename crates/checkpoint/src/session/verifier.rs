//! Per-action pass policy.

use checkpoint_common::{ConfigError, LivenessAction, StabilityState};
use rand::{Rng, RngCore};

/// Decides whether a gesture was performed once its time runs out.
///
/// Only consulted when the face is stable at evaluation time.
pub trait ActionVerifier: Send {
    fn verify(
        &mut self,
        action: &LivenessAction,
        stability: StabilityState,
        rng: &mut dyn RngCore,
    ) -> bool;
}

/// Placeholder for a per-gesture classifier: passes with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomPassVerifier {
    pass_rate: f64,
}

impl RandomPassVerifier {
    pub fn new(pass_rate: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&pass_rate) {
            return Err(ConfigError::InvalidPassRate(pass_rate));
        }
        Ok(Self { pass_rate })
    }

    pub fn pass_rate(&self) -> f64 {
        self.pass_rate
    }
}

impl ActionVerifier for RandomPassVerifier {
    fn verify(
        &mut self,
        action: &LivenessAction,
        _stability: StabilityState,
        rng: &mut dyn RngCore,
    ) -> bool {
        let passed = rng.random_bool(self.pass_rate);
        tracing::trace!(action = ?action.id, passed, "Random action check");
        passed
    }
}
