//! Liveness session state machine.
//!
//! ```text
//! Idle ──start──▶ Ready{3} ─tick─▶ Ready{2} ─tick─▶ Ready{1} ─tick─▶ InAction{a0, 4000}
//!                                                                      │ tick ×4
//!                                     ┌── face unstable ──▶ Failed{FaceLost}
//!                                     ├── check failed ───▶ Failed{ActionNotFollowed}
//!                                     ├── passed, more ───▶ InAction{a(n+1), 4000}
//!                                     └── passed, last ───▶ Succeeded{a0, a1, a2}
//! Failed ── 2000 ms ──▶ Idle          any ──cancel──▶ Idle
//! ```
//!
//! The machine is driven by an external 1000 ms tick and never reads a
//! clock itself.

use checkpoint_common::constants::{COUNTDOWN_START, FAILURE_COOLDOWN_MS, SESSION_TICK_MS};
use checkpoint_common::{
    ChallengeSequence, FailureReason, PreconditionUnmet, SessionState, StabilityState,
    StartRejection,
};
use rand::RngCore;

use super::ActionVerifier;
use crate::challenge::ChallengeSelector;

/// Location precondition as asserted by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationGate {
    Valid,
    Invalid,
    Pending,
}

/// What a tick did, so callers can react to each transition exactly once
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing to do in this state
    Unchanged,
    /// Countdown or action timer moved, or the next action began
    Advanced,
    /// Last action passed
    Succeeded(ChallengeSequence),
    /// Attempt failed and entered cool-down
    Failed(FailureReason),
    /// Cool-down elapsed; back to idle
    Reset,
}

/// Tick cadence and phase lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineTiming {
    pub tick_ms: u64,
    pub countdown: u32,
    pub cooldown_ms: u64,
}

impl Default for MachineTiming {
    fn default() -> Self {
        Self {
            tick_ms: SESSION_TICK_MS,
            countdown: COUNTDOWN_START,
            cooldown_ms: FAILURE_COOLDOWN_MS,
        }
    }
}

pub struct LivenessSessionMachine {
    state: SessionState,
    sequence: Option<ChallengeSequence>,
    step: usize,
    cooldown_remaining_ms: u64,
    timing: MachineTiming,
    selector: ChallengeSelector,
    verifier: Box<dyn ActionVerifier>,
}

impl LivenessSessionMachine {
    pub fn new(selector: ChallengeSelector, verifier: Box<dyn ActionVerifier>) -> Self {
        Self {
            state: SessionState::Idle,
            sequence: None,
            step: 0,
            cooldown_remaining_ms: 0,
            timing: MachineTiming::default(),
            selector,
            verifier,
        }
    }

    pub fn with_timing(mut self, timing: MachineTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Challenge drawn for the current attempt
    pub fn sequence(&self) -> Option<&ChallengeSequence> {
        self.sequence.as_ref()
    }

    /// Running or cooling down after a failure
    pub fn is_active(&self) -> bool {
        self.state.is_running() || matches!(self.state, SessionState::Failed { .. })
    }

    /// Begin an attempt from `Idle` (or after a success). Draws a fresh
    /// challenge. A rejection leaves the state untouched.
    pub fn start(
        &mut self,
        gate: LocationGate,
        stability: StabilityState,
        rng: &mut dyn RngCore,
    ) -> Result<(), StartRejection> {
        if self.is_active() {
            return Err(StartRejection::SessionActive);
        }
        if !stability.is_stable() {
            return Err(StartRejection::PreconditionsNotMet(
                PreconditionUnmet::FaceNotStable,
            ));
        }
        match gate {
            LocationGate::Valid => {}
            LocationGate::Invalid => {
                return Err(StartRejection::PreconditionsNotMet(
                    PreconditionUnmet::LocationInvalid,
                ));
            }
            LocationGate::Pending => {
                return Err(StartRejection::PreconditionsNotMet(
                    PreconditionUnmet::LocationPending,
                ));
            }
        }

        let sequence = self.selector.select(rng);
        tracing::debug!(actions = ?sequence.ids(), "Challenge drawn");

        self.sequence = Some(sequence);
        self.step = 0;
        self.cooldown_remaining_ms = 0;
        self.state = SessionState::Ready {
            countdown: self.timing.countdown,
        };
        Ok(())
    }

    /// Advance by one tick
    pub fn tick(&mut self, stability: StabilityState, rng: &mut dyn RngCore) -> TickOutcome {
        match self.state.clone() {
            SessionState::Idle | SessionState::Succeeded { .. } => TickOutcome::Unchanged,

            SessionState::Ready { countdown } => {
                if countdown <= 1 {
                    self.begin_action(0)
                } else {
                    self.state = SessionState::Ready {
                        countdown: countdown - 1,
                    };
                    TickOutcome::Advanced
                }
            }

            SessionState::InAction {
                action,
                remaining_ms,
            } => {
                let remaining_ms = remaining_ms.saturating_sub(self.timing.tick_ms);
                if remaining_ms > 0 {
                    self.state = SessionState::InAction {
                        action,
                        remaining_ms,
                    };
                    return TickOutcome::Advanced;
                }

                if !stability.is_stable() {
                    return self.fail(FailureReason::FaceLost);
                }
                if !self.verifier.verify(&action, stability, rng) {
                    return self.fail(FailureReason::ActionNotFollowed);
                }

                tracing::debug!(action = ?action.id, step = self.step, "Action passed");
                self.begin_action(self.step + 1)
            }

            SessionState::Failed { .. } => {
                self.cooldown_remaining_ms = self
                    .cooldown_remaining_ms
                    .saturating_sub(self.timing.tick_ms);
                if self.cooldown_remaining_ms > 0 {
                    return TickOutcome::Unchanged;
                }
                self.clear();
                TickOutcome::Reset
            }
        }
    }

    /// Abort from any state. Returns false if already idle.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, SessionState::Idle) {
            return false;
        }
        self.clear();
        true
    }

    fn begin_action(&mut self, step: usize) -> TickOutcome {
        let Some(sequence) = self.sequence.as_ref() else {
            // Ready/InAction are only entered through start(), which sets it
            self.clear();
            return TickOutcome::Reset;
        };

        match sequence.get(step) {
            Some(action) => {
                self.step = step;
                self.state = SessionState::InAction {
                    action: *action,
                    remaining_ms: action.duration_ms,
                };
                TickOutcome::Advanced
            }
            None => {
                let completed = sequence.clone();
                self.state = SessionState::Succeeded {
                    completed_actions: completed.clone(),
                };
                TickOutcome::Succeeded(completed)
            }
        }
    }

    fn fail(&mut self, reason: FailureReason) -> TickOutcome {
        self.state = SessionState::Failed { reason };
        self.cooldown_remaining_ms = self.timing.cooldown_ms;
        TickOutcome::Failed(reason)
    }

    fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.sequence = None;
        self.step = 0;
        self.cooldown_remaining_ms = 0;
    }
}
