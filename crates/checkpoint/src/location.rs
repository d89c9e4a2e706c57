//! Location fix tracking and request fallback.
//!
//! The provider is asked for a precise fix first. A transient failure
//! triggers one coarse retry (low accuracy, older cached fixes accepted).
//! A permission denial is never retried automatically. The last good fix is
//! kept across any number of failures.

use std::time::Duration;

use checkpoint_common::constants::location::{
    COARSE_MAX_AGE_MS, COARSE_TIMEOUT_MS, PRECISE_MAX_AGE_MS, PRECISE_TIMEOUT_MS,
};
use checkpoint_common::{GeoPoint, LocationError};
use serde::Serialize;

/// Options the external provider should use for its next fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl LocationRequest {
    pub fn precise() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(PRECISE_TIMEOUT_MS),
            maximum_age: Duration::from_millis(PRECISE_MAX_AGE_MS),
        }
    }

    pub fn coarse() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_millis(COARSE_TIMEOUT_MS),
            maximum_age: Duration::from_millis(COARSE_MAX_AGE_MS),
        }
    }
}

/// Where location acquisition stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    /// No fix and no error yet
    #[default]
    Pending,
    /// Most recent update was a fix
    Acquired,
    /// Most recent update was a transient error; last fix, if any, is stale
    Degraded,
    /// User refused location access
    Denied,
}

#[derive(Debug, Default)]
pub struct LocationTracker {
    last_fix: Option<GeoPoint>,
    last_error: Option<LocationError>,
    status: LocationStatus,
    fallback_used: bool,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request to issue when a session opens
    pub fn initial_request(&self) -> LocationRequest {
        LocationRequest::precise()
    }

    /// Record a provider update. Returns the follow-up request the provider
    /// should run, if any.
    pub fn on_update(&mut self, update: Result<GeoPoint, LocationError>) -> Option<LocationRequest> {
        match update {
            Ok(fix) => {
                self.last_fix = Some(fix);
                self.last_error = None;
                self.status = LocationStatus::Acquired;
                self.fallback_used = false;
                None
            }
            Err(error) => {
                self.last_error = Some(error);
                if !error.is_transient() {
                    self.status = LocationStatus::Denied;
                    return None;
                }

                self.status = LocationStatus::Degraded;
                if self.fallback_used {
                    None
                } else {
                    self.fallback_used = true;
                    Some(LocationRequest::coarse())
                }
            }
        }
    }

    pub fn last_fix(&self) -> Option<&GeoPoint> {
        self.last_fix.as_ref()
    }

    pub fn last_error(&self) -> Option<LocationError> {
        self.last_error
    }

    pub fn status(&self) -> LocationStatus {
        self.status
    }
}
