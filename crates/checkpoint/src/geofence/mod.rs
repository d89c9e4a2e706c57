//! Geofence validation.
//!
//! Decides whether a position fix lies inside an allowed site using the
//! haversine great-circle distance.

mod registry;
mod validator;

pub use registry::SiteRegistry;
pub use validator::{evaluate, haversine_distance};
