//! Attendance records.
//!
//! A record can only be built from a `VerifiedFix`, i.e. a geofence result
//! that was valid when the attempt started, together with the completed
//! challenge. Fields are read-only once constructed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use checkpoint_common::{ChallengeSequence, GeoPoint, GeofenceResult, StabilityState};
use rand::RngCore;
use serde::Serialize;

/// A fix whose geofence evaluation passed
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedFix {
    fix: GeoPoint,
    geofence: GeofenceResult,
}

impl VerifiedFix {
    /// None unless the geofence result is valid
    pub fn new(fix: GeoPoint, geofence: GeofenceResult) -> Option<Self> {
        geofence.is_valid.then_some(Self { fix, geofence })
    }

    pub fn fix(&self) -> &GeoPoint {
        &self.fix
    }

    pub fn geofence(&self) -> &GeofenceResult {
        &self.geofence
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    record_id: String,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_id: Option<String>,
    location: GeoPoint,
    geofence: GeofenceResult,
    completed_actions: ChallengeSequence,
    stability_score: f64,
    simulation_mode: bool,
}

impl AttendanceRecord {
    pub(crate) fn from_success(
        verified: VerifiedFix,
        completed_actions: ChallengeSequence,
        stability: StabilityState,
        subject_id: Option<String>,
        simulation_mode: bool,
        rng: &mut dyn RngCore,
    ) -> Self {
        Self {
            record_id: generate_record_id(rng),
            timestamp: Utc::now(),
            subject_id,
            location: verified.fix,
            geofence: verified.geofence,
            completed_actions,
            stability_score: stability.score(),
            simulation_mode,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    pub fn location(&self) -> &GeoPoint {
        &self.location
    }

    pub fn geofence(&self) -> &GeofenceResult {
        &self.geofence
    }

    pub fn completed_actions(&self) -> &ChallengeSequence {
        &self.completed_actions
    }

    pub fn stability_score(&self) -> f64 {
        self.stability_score
    }

    pub fn simulation_mode(&self) -> bool {
        self.simulation_mode
    }
}

/// Random URL-safe record identifier
fn generate_record_id(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use checkpoint_common::{AllowedSite, LivenessAction};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    pub(crate) fn sample_record(seed: u64) -> AttendanceRecord {
        let site = AllowedSite {
            name: "Main Building".to_string(),
            center: GeoPoint::new(0.0, 0.0),
            radius_meters: 100.0,
        };
        let fix = GeoPoint::new(0.0, 0.0002).with_accuracy(8.0);
        let geofence = crate::geofence::evaluate(&fix, &site);
        let verified = VerifiedFix::new(fix, geofence).unwrap();
        let actions = ChallengeSequence::new(LivenessAction::CATALOG[..3].to_vec()).unwrap();

        AttendanceRecord::from_success(
            verified,
            actions,
            StabilityState::new(9),
            Some("student-001".to_string()),
            true,
            &mut StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn invalid_geofence_cannot_be_verified() {
        let site = AllowedSite {
            name: "Main Building".to_string(),
            center: GeoPoint::new(0.0, 0.0),
            radius_meters: 100.0,
        };
        let fix = GeoPoint::new(0.0, 0.01);
        let geofence = crate::geofence::evaluate(&fix, &site);
        assert!(VerifiedFix::new(fix, geofence).is_none());
    }

    #[test]
    fn record_captures_success_snapshot() {
        let record = sample_record(1);
        assert_eq!(record.completed_actions().len(), 3);
        assert!(record.geofence().is_valid);
        assert_eq!(record.stability_score(), 0.9);
        assert_eq!(record.subject_id(), Some("student-001"));
        assert_eq!(record.record_id().len(), 22);
    }

    #[test]
    fn record_json_shape() {
        let json = serde_json::to_value(sample_record(2)).unwrap();
        assert_eq!(json["completed_actions"][0]["id"], "blink");
        assert_eq!(json["geofence"]["site"]["name"], "Main Building");
        assert_eq!(json["simulation_mode"], true);
    }
}
