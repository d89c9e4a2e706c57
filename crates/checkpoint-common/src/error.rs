//! Error taxonomy for Checkpoint components.
//!
//! - `ConfigError`: invalid startup configuration, always fatal
//! - `StartRejection`: synchronous refusal to begin an attempt, no state change
//! - `LocationError`: failures reported by the external location provider
//!
//! In-session failures are not errors; they surface as `SessionState::Failed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Startup configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No allowed site was configured
    #[error("at least one allowed site must be configured")]
    NoSites,

    /// Site is missing one or both coordinates
    #[error("site '{site}' is missing coordinates")]
    MissingCoordinates { site: String },

    /// Site coordinates are not a valid latitude/longitude
    #[error("site '{site}' has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        site: String,
        latitude: f64,
        longitude: f64,
    },

    /// Site radius must be strictly positive
    #[error("site '{site}' has invalid radius {radius_meters} m (must be > 0)")]
    InvalidRadius { site: String, radius_meters: f64 },

    /// Action catalog cannot supply a full challenge
    #[error("action catalog has {catalog_len} entries, challenge needs {challenge_len}")]
    CatalogTooSmall {
        catalog_len: usize,
        challenge_len: usize,
    },

    /// Pass rate of the action verifier must be a probability
    #[error("action pass rate {0} is outside [0, 1]")]
    InvalidPassRate(f64),

    /// Signing key could not be loaded
    #[error("signing key error: {0}")]
    SigningKey(String),
}

/// Which start precondition was not met
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionUnmet {
    /// Face stability has not reached the threshold
    FaceNotStable,
    /// The caller reported an invalid location
    LocationInvalid,
    /// No location fix is available yet
    LocationPending,
}

impl std::fmt::Display for PreconditionUnmet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::FaceNotStable => "face not stable",
            Self::LocationInvalid => "location invalid",
            Self::LocationPending => "location pending",
        };
        f.write_str(text)
    }
}

/// Reasons `start()` refuses to begin an attempt
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartRejection {
    /// An attempt is already running (or cooling down)
    #[error("an attendance attempt is already active")]
    SessionActive,

    /// Most recent fix lies outside the allowed site
    #[error("{distance_meters:.0} m from {site}, maximum allowed is {allowed_radius_meters:.0} m")]
    OutOfRange {
        distance_meters: f64,
        allowed_radius_meters: f64,
        site: String,
    },

    /// Generic precondition failure from the liveness machine
    #[error("preconditions not met: {0}")]
    PreconditionsNotMet(PreconditionUnmet),
}

impl StartRejection {
    /// Returns true if the same call may succeed later without user action
    /// beyond holding still or waiting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SessionActive
                | Self::PreconditionsNotMet(PreconditionUnmet::FaceNotStable)
                | Self::PreconditionsNotMet(PreconditionUnmet::LocationPending)
        )
    }
}

/// Errors delivered by the external location provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location request timed out")]
    Timeout,

    #[error("location unavailable")]
    Unavailable,
}

impl LocationError {
    /// Transient errors are worth a fallback request; a denial is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_carries_distance() {
        let rejection = StartRejection::OutOfRange {
            distance_meters: 111.2,
            allowed_radius_meters: 100.0,
            site: "Main Building".to_string(),
        };
        assert_eq!(
            rejection.to_string(),
            "111 m from Main Building, maximum allowed is 100 m"
        );
        assert!(!rejection.is_retryable());
    }

    #[test]
    fn precondition_messages_are_distinct() {
        let face = StartRejection::PreconditionsNotMet(PreconditionUnmet::FaceNotStable);
        let pending = StartRejection::PreconditionsNotMet(PreconditionUnmet::LocationPending);
        assert_ne!(face.to_string(), pending.to_string());
        assert!(face.is_retryable());
    }

    #[test]
    fn only_denial_is_permanent() {
        assert!(LocationError::Timeout.is_transient());
        assert!(LocationError::Unavailable.is_transient());
        assert!(!LocationError::PermissionDenied.is_transient());
    }
}
