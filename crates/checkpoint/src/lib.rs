//! # Checkpoint - attendance verification engine
//!
//! Decides whether a person may check in: their location must fall inside a
//! configured site, and they must pass a short randomized liveness challenge
//! while their face stays in frame. A successful attempt yields exactly one
//! signed `AttendanceRecord`.
//!
//! ## Architecture
//! ```text
//! LocationProvider ─┐
//! FaceSensor ───────┼→ SessionRuntime → AttendanceSessionController → AttendanceSubmitter
//! user commands ────┘        (timers)      (geofence, stability, machine, signer)
//! ```

pub mod challenge;
pub mod controller;
pub mod geofence;
pub mod location;
pub mod record;
pub mod runtime;
pub mod session;
pub mod signal;
pub mod signing;
pub mod stability;
pub mod submit;

pub use controller::{AttendanceSessionController, SessionSnapshot};
pub use runtime::{LocationUpdate, RuntimeError, SessionHandle, SessionRuntime};
