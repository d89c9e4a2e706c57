//! Shared constants for Checkpoint components.

/// Mean Earth radius used for great-circle distances (meters)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Face presence sampling cadence (milliseconds)
pub const FACE_SAMPLE_INTERVAL_MS: u64 = 200;

/// Countdown / action tick cadence (milliseconds)
pub const SESSION_TICK_MS: u64 = 1000;

/// Countdown steps before the first action
pub const COUNTDOWN_START: u32 = 3;

/// Time allotted to every liveness action (milliseconds)
pub const ACTION_DURATION_MS: u64 = 4000;

/// Cool-down after a failed attempt before returning to idle (milliseconds)
pub const FAILURE_COOLDOWN_MS: u64 = 2000;

/// Number of actions drawn per attempt
pub const CHALLENGE_LENGTH: usize = 3;

/// Default pass rate of the placeholder action verifier
pub const DEFAULT_ACTION_PASS_RATE: f64 = 0.8;

/// Default path of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/checkpoint.toml";

/// Stability counter bounds and threshold
pub mod stability {
    /// Upper clamp of the stability counter
    pub const MAX: u8 = 10;

    /// Counter value at which the face is considered stable
    pub const STABLE_THRESHOLD: u8 = 5;

    /// Increment applied per present sample
    pub const GAIN: u8 = 1;

    /// Decrement applied per absent sample
    pub const DECAY: u8 = 2;
}

/// Probabilities of the simulated capture conditions
pub mod synthetic {
    /// Probability that lighting is adequate
    pub const LIGHTING_OK: f64 = 0.90;

    /// Probability that the face is inside the frame
    pub const FRAMING_OK: f64 = 0.85;

    /// Probability that the device is held steady
    pub const STEADY_OK: f64 = 0.90;
}

/// Location request plans
pub mod location {
    /// High-accuracy request timeout (milliseconds)
    pub const PRECISE_TIMEOUT_MS: u64 = 15_000;

    /// High-accuracy request maximum cached fix age (milliseconds)
    pub const PRECISE_MAX_AGE_MS: u64 = 10_000;

    /// Fallback request timeout (milliseconds)
    pub const COARSE_TIMEOUT_MS: u64 = 10_000;

    /// Fallback request maximum cached fix age (milliseconds)
    pub const COARSE_MAX_AGE_MS: u64 = 60_000;
}
