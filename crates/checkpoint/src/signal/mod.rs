//! Face presence signal sources.
//!
//! The scheduler polls the active source every 200 ms. Two implementations:
//! - `SensorSource`: observations pushed by an external face detector
//! - `SyntheticSource`: simulated presence used when no detector exists
//!
//! Callers must be told when the synthetic source is active so they can
//! disclose simulation mode to the user.

mod guide;
mod sensor;
mod synthetic;

pub use guide::{Alignment, FaceGuide};
pub use sensor::SensorSource;
pub use synthetic::SyntheticSource;

use serde::{Deserialize, Serialize};

/// One presence reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSample {
    pub present: bool,
}

/// Bounding region of a detected face, in preview pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Raw observation delivered by an external face detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<FaceRegion>,
}

impl FaceObservation {
    pub fn present() -> Self {
        Self {
            present: true,
            region: None,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            region: None,
        }
    }
}

/// Which kind of source is producing samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Sensor,
    Synthetic,
}

/// Result of polling a source once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePoll {
    /// A fresh sample for this tick
    Sample(FaceSample),
    /// Nothing new since the previous poll
    Idle,
    /// The feed is gone for good
    Lost,
}

/// Producer of face presence samples
pub trait FaceSignalSource: Send {
    fn next_sample(&mut self) -> SourcePoll;

    fn kind(&self) -> SignalKind;
}
