//! Configured set of allowed sites.

use checkpoint_common::{AllowedSite, ConfigError, GeoPoint, GeofenceResult};

use super::validator::evaluate;

/// Validated, immutable list of allowed sites
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: Vec<AllowedSite>,
}

impl SiteRegistry {
    /// Validate every site. An empty list, a radius that is not strictly
    /// positive, or coordinates off the globe are startup errors.
    pub fn new(sites: Vec<AllowedSite>) -> Result<Self, ConfigError> {
        if sites.is_empty() {
            return Err(ConfigError::NoSites);
        }

        for site in &sites {
            if !site.center.has_valid_coordinates() {
                return Err(ConfigError::InvalidCoordinates {
                    site: site.name.clone(),
                    latitude: site.center.latitude,
                    longitude: site.center.longitude,
                });
            }
            if !site.radius_meters.is_finite() || site.radius_meters <= 0.0 {
                return Err(ConfigError::InvalidRadius {
                    site: site.name.clone(),
                    radius_meters: site.radius_meters,
                });
            }
        }

        Ok(Self { sites })
    }

    pub fn sites(&self) -> &[AllowedSite] {
        &self.sites
    }

    /// Evaluate against the nearest site (first configured wins ties)
    pub fn evaluate(&self, current: &GeoPoint) -> GeofenceResult {
        let mut best = evaluate(current, &self.sites[0]);
        for site in &self.sites[1..] {
            let result = evaluate(current, site);
            if result.distance_meters < best.distance_meters {
                best = result;
            }
        }
        best
    }
}
