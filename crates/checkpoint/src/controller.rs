//! Attendance session controller.
//!
//! Owns every piece of per-user session state: the latest geofence result,
//! the face signal source and its stability accumulator, the liveness
//! machine, and the signer/submitter pair that receives the final record.
//! The controller is synchronous; `runtime::SessionRuntime` drives it from
//! timers.

use std::sync::Arc;

use checkpoint_common::{
    ChallengeSequence, GeoPoint, GeofenceResult, LocationError, SessionState, StabilityState,
    StartRejection,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

use crate::geofence::SiteRegistry;
use crate::location::{LocationRequest, LocationStatus, LocationTracker};
use crate::record::{AttendanceRecord, VerifiedFix};
use crate::session::{LivenessSessionMachine, LocationGate, TickOutcome};
use crate::signal::{FaceSample, FaceSignalSource, SignalKind, SourcePoll, SyntheticSource};
use crate::signing::{RecordSigner, SignedAttendanceRecord};
use crate::stability::StabilityAccumulator;
use crate::submit::AttendanceSubmitter;

/// Point-in-time view for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub prompt: String,
    pub stability: StabilityState,
    pub stability_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence: Option<GeofenceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence_message: Option<String>,
    pub location_status: LocationStatus,
    pub simulation_mode: bool,
}

pub struct AttendanceSessionController {
    sites: SiteRegistry,
    location: LocationTracker,
    geofence: Option<GeofenceResult>,
    source: Box<dyn FaceSignalSource>,
    stability: StabilityAccumulator,
    machine: LivenessSessionMachine,
    rng: Box<dyn RngCore + Send>,
    signer: RecordSigner,
    submitter: Arc<dyn AttendanceSubmitter>,
    subject_id: Option<String>,
    /// Location snapshot taken when the current attempt started
    verified: Option<VerifiedFix>,
    last_record: Option<SignedAttendanceRecord>,
}

impl AttendanceSessionController {
    pub fn new(
        sites: SiteRegistry,
        machine: LivenessSessionMachine,
        source: Box<dyn FaceSignalSource>,
        signer: RecordSigner,
        submitter: Arc<dyn AttendanceSubmitter>,
    ) -> Self {
        Self {
            sites,
            location: LocationTracker::new(),
            geofence: None,
            source,
            stability: StabilityAccumulator::new(),
            machine,
            rng: Box::new(StdRng::from_os_rng()),
            signer,
            submitter,
            subject_id: None,
            verified: None,
            last_record: None,
        }
    }

    /// Replace the random source (tests use a seeded one)
    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    /// Identify the user checking in
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    // === Collaborator input ===

    /// Feed a provider update. Returns the request the provider should run
    /// next, if a fallback is warranted. A fix off the globe counts as
    /// `Unavailable`.
    pub fn on_location(
        &mut self,
        update: Result<GeoPoint, LocationError>,
    ) -> Option<LocationRequest> {
        let update = match update {
            Ok(fix) if !fix.has_valid_coordinates() => {
                tracing::warn!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    "Discarding fix with invalid coordinates"
                );
                Err(LocationError::Unavailable)
            }
            other => other,
        };

        match &update {
            Ok(fix) => {
                let result = self.sites.evaluate(fix);
                tracing::debug!(
                    site = %result.site.name,
                    distance_m = result.distance_meters,
                    valid = result.is_valid,
                    "Geofence evaluated"
                );
                self.geofence = Some(result);
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    has_fix = self.location.last_fix().is_some(),
                    "Location update failed"
                );
            }
        }
        self.location.on_update(update)
    }

    /// 200 ms face tick
    pub fn on_face_tick(&mut self) -> Option<FaceSample> {
        match self.source.next_sample() {
            SourcePoll::Sample(sample) => {
                self.stability.on_sample(sample.present);
                Some(sample)
            }
            SourcePoll::Idle => None,
            SourcePoll::Lost => {
                tracing::warn!("Face sensor feed closed, switching to simulation mode");
                self.source = Box::new(SyntheticSource::new());
                None
            }
        }
    }

    /// 1000 ms session tick
    pub fn on_session_tick(&mut self) -> TickOutcome {
        let stability = self.stability.read();
        let outcome = self.machine.tick(stability, self.rng.as_mut());

        match &outcome {
            TickOutcome::Succeeded(completed) => self.complete(completed.clone(), stability),
            TickOutcome::Failed(reason) => {
                tracing::warn!(
                    reason = ?reason,
                    stability = stability.counter(),
                    "Liveness attempt failed"
                );
                self.verified = None;
            }
            TickOutcome::Reset => {
                self.stability.reset();
                tracing::debug!("Cool-down elapsed, ready for a new attempt");
            }
            TickOutcome::Advanced => tracing::trace!(state = ?self.machine.state(), "Session tick"),
            TickOutcome::Unchanged => {}
        }

        outcome
    }

    // === User commands ===

    /// Begin an attempt. Out-of-range fixes are refused here, with the
    /// distance, before the machine's own checks run.
    pub fn start(&mut self) -> Result<(), StartRejection> {
        if self.machine.is_active() {
            return Err(StartRejection::SessionActive);
        }

        let current = match (self.location.last_fix(), &self.geofence) {
            (Some(fix), Some(result)) => {
                if !result.is_valid {
                    return Err(StartRejection::OutOfRange {
                        distance_meters: result.distance_meters,
                        allowed_radius_meters: result.site.radius_meters,
                        site: result.site.name.clone(),
                    });
                }
                VerifiedFix::new(*fix, result.clone())
            }
            _ => None,
        };
        let gate = match (&current, self.location.status()) {
            (Some(_), _) => LocationGate::Valid,
            // Never retried, so waiting would not help
            (None, LocationStatus::Denied) => LocationGate::Invalid,
            (None, _) => LocationGate::Pending,
        };

        let stability = self.stability.read();
        if let Err(rejection) = self.machine.start(gate, stability, self.rng.as_mut()) {
            tracing::debug!(rejection = %rejection, "Start rejected");
            return Err(rejection);
        }

        self.verified = current;
        tracing::info!(
            actions = ?self.machine.sequence().map(|s| s.ids()),
            stability = stability.counter(),
            simulation_mode = self.simulation_mode(),
            "Liveness attempt started"
        );
        Ok(())
    }

    /// Abort the current attempt. No-op when idle.
    pub fn cancel(&mut self) {
        if self.machine.cancel() {
            self.stability.reset();
            self.verified = None;
            tracing::info!("Liveness attempt cancelled");
        }
    }

    // === Accessors ===

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn stability(&self) -> StabilityState {
        self.stability.read()
    }

    /// Latest evaluation; None until a fix arrives (treated as invalid)
    pub fn geofence(&self) -> Option<&GeofenceResult> {
        self.geofence.as_ref()
    }

    pub fn location_status(&self) -> LocationStatus {
        self.location.status()
    }

    pub fn initial_location_request(&self) -> LocationRequest {
        self.location.initial_request()
    }

    /// True when presence comes from the synthetic generator
    pub fn simulation_mode(&self) -> bool {
        self.source.kind() == SignalKind::Synthetic
    }

    pub fn challenge(&self) -> Option<&ChallengeSequence> {
        self.machine.sequence()
    }

    pub fn last_record(&self) -> Option<&SignedAttendanceRecord> {
        self.last_record.as_ref()
    }

    pub fn signer_public_key(&self) -> String {
        self.signer.public_key_b64()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let stability = self.stability.read();
        SessionSnapshot {
            state: self.machine.state().clone(),
            prompt: self.machine.state().to_string(),
            stability,
            stability_score: stability.score(),
            geofence: self.geofence.clone(),
            geofence_message: self.geofence.as_ref().map(GeofenceResult::message),
            location_status: self.location.status(),
            simulation_mode: self.simulation_mode(),
        }
    }

    fn complete(&mut self, completed: ChallengeSequence, stability: StabilityState) {
        let Some(verified) = self.verified.take() else {
            tracing::error!("Attempt succeeded without a verified location; no record emitted");
            return;
        };

        let record = AttendanceRecord::from_success(
            verified,
            completed,
            stability,
            self.subject_id.clone(),
            self.simulation_mode(),
            self.rng.as_mut(),
        );

        match self.signer.sign(record) {
            Ok(signed) => {
                tracing::info!(
                    record_id = signed.record.record_id(),
                    site = %signed.record.geofence().site.name,
                    distance_m = signed.record.geofence().distance_meters,
                    "Attendance verified"
                );
                self.last_record = Some(signed.clone());
                self.submitter.submit(signed);
            }
            Err(e) => tracing::error!(error = %e, "Failed to sign attendance record"),
        }
    }
}
