//! Timed liveness challenge.

mod machine;
mod verifier;

pub use machine::{LivenessSessionMachine, LocationGate, MachineTiming, TickOutcome};
pub use verifier::{ActionVerifier, RandomPassVerifier};
