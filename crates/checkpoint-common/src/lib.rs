//! # Checkpoint Common
//!
//! Shared types, errors, and constants used across Checkpoint components.
//!
//! ## Modules
//! - `types` - Core data structures (GeoPoint, SessionState, etc.)
//! - `error` - Error taxonomy (configuration, rejections, collaborators)
//! - `constants` - Timing and policy constants

pub mod constants;
pub mod error;
pub mod types;

pub use error::{ConfigError, LocationError, PreconditionUnmet, StartRejection};
pub use types::*;
