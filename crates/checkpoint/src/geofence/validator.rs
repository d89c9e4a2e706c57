//! Haversine distance and single-site evaluation.

use checkpoint_common::constants::EARTH_RADIUS_METERS;
use checkpoint_common::{AllowedSite, GeoPoint, GeofenceResult};

/// Great-circle distance between two fixes, in meters
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Evaluate a fix against one site. The boundary is inclusive.
pub fn evaluate(current: &GeoPoint, site: &AllowedSite) -> GeofenceResult {
    let distance_meters = haversine_distance(current, &site.center);
    GeofenceResult {
        is_valid: distance_meters <= site.radius_meters,
        distance_meters,
        site: site.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(radius_meters: f64) -> AllowedSite {
        AllowedSite {
            name: "Origin".to_string(),
            center: GeoPoint::new(0.0, 0.0),
            radius_meters,
        }
    }

    #[test]
    fn identical_points_are_zero_distance() {
        for (lat, lon) in [(0.0, 0.0), (-8.157_560, 113.722_784), (89.9, -179.9)] {
            let p = GeoPoint::new(lat, lon);
            let s = AllowedSite {
                name: "Here".to_string(),
                center: p,
                radius_meters: 0.0,
            };
            let result = evaluate(&p, &s);
            assert_eq!(result.distance_meters, 0.0);
            assert!(result.is_valid);
        }
    }

    #[test]
    fn known_fixture_distances() {
        let far = evaluate(&GeoPoint::new(0.0, 0.001), &site(100.0));
        assert!((far.distance_meters - 111.19).abs() < 0.5);
        assert!(!far.is_valid);

        let near = evaluate(&GeoPoint::new(0.0, 0.0005), &site(100.0));
        assert!((near.distance_meters - 55.6).abs() < 0.5);
        assert!(near.is_valid);
    }

    #[test]
    fn boundary_is_inclusive() {
        let p = GeoPoint::new(0.0, 0.001);
        let exact = haversine_distance(&p, &GeoPoint::new(0.0, 0.0));
        assert!(evaluate(&p, &site(exact)).is_valid);
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_distance(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }
}
