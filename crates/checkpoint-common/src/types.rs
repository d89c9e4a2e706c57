//! Core types shared across Checkpoint components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ACTION_DURATION_MS, stability};

/// A position fix (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,

    /// Horizontal accuracy radius reported by the provider (meters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,

    pub timestamp: DateTime<Utc>,
}

impl GeoPoint {
    /// Create a fix stamped with the current time
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = Some(accuracy_meters);
        self
    }

    /// Latitude within [-90, 90], longitude within [-180, 180], both finite
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A circular region in which check-in is allowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedSite {
    pub name: String,
    pub center: GeoPoint,
    pub radius_meters: f64,
}

/// Outcome of evaluating a fix against a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceResult {
    pub is_valid: bool,
    pub distance_meters: f64,
    pub site: AllowedSite,
}

impl GeofenceResult {
    /// Human-readable validation message
    pub fn message(&self) -> String {
        if self.is_valid {
            format!(
                "Inside {} ({:.0} m from center)",
                self.site.name, self.distance_meters
            )
        } else {
            format!(
                "{:.0} m from {}, maximum allowed is {:.0} m",
                self.distance_meters, self.site.name, self.site.radius_meters
            )
        }
    }
}

/// Liveness gesture identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Blink,
    Smile,
    TurnLeft,
    TurnRight,
    Nod,
    OpenMouth,
}

/// A gesture the user is asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LivenessAction {
    pub id: ActionId,
    pub instruction: &'static str,
    pub duration_ms: u64,
}

impl LivenessAction {
    /// The fixed action catalog
    pub const CATALOG: [LivenessAction; 6] = [
        Self::of(ActionId::Blink, "Blink your eyes"),
        Self::of(ActionId::Smile, "Smile"),
        Self::of(ActionId::TurnLeft, "Turn your head to the left"),
        Self::of(ActionId::TurnRight, "Turn your head to the right"),
        Self::of(ActionId::Nod, "Nod your head"),
        Self::of(ActionId::OpenMouth, "Open your mouth"),
    ];

    const fn of(id: ActionId, instruction: &'static str) -> Self {
        Self {
            id,
            instruction,
            duration_ms: ACTION_DURATION_MS,
        }
    }

    /// Look up a catalog entry by id
    pub fn from_id(id: ActionId) -> Self {
        match id {
            ActionId::Blink => Self::CATALOG[0],
            ActionId::Smile => Self::CATALOG[1],
            ActionId::TurnLeft => Self::CATALOG[2],
            ActionId::TurnRight => Self::CATALOG[3],
            ActionId::Nod => Self::CATALOG[4],
            ActionId::OpenMouth => Self::CATALOG[5],
        }
    }
}

/// Ordered, duplicate-free list of actions for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChallengeSequence(Vec<LivenessAction>);

impl ChallengeSequence {
    /// Returns None for an empty list or one with repeated action ids
    pub fn new(actions: Vec<LivenessAction>) -> Option<Self> {
        if actions.is_empty() {
            return None;
        }
        let distinct = actions
            .iter()
            .enumerate()
            .all(|(i, a)| actions[..i].iter().all(|b| b.id != a.id));
        distinct.then_some(Self(actions))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LivenessAction> {
        self.0.get(index)
    }

    pub fn actions(&self) -> &[LivenessAction] {
        &self.0
    }

    pub fn ids(&self) -> Vec<ActionId> {
        self.0.iter().map(|a| a.id).collect()
    }
}

/// Debounced face presence level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StabilityState {
    counter: u8,
}

impl StabilityState {
    /// Create a state, clamping the counter to [0, 10]
    pub const fn new(counter: u8) -> Self {
        let counter = if counter > stability::MAX {
            stability::MAX
        } else {
            counter
        };
        Self { counter }
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Stability in [0, 1]
    pub fn score(&self) -> f64 {
        (f64::from(self.counter) / f64::from(stability::MAX)).clamp(0.0, 1.0)
    }

    pub fn is_stable(&self) -> bool {
        self.counter >= stability::STABLE_THRESHOLD
    }
}

/// Why an attempt ended in failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Face was not stable when an action was evaluated
    FaceLost,
    /// The action check did not pass
    ActionNotFollowed,
}

/// Liveness attempt state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Ready {
        countdown: u32,
    },
    InAction {
        action: LivenessAction,
        remaining_ms: u64,
    },
    Succeeded {
        completed_actions: ChallengeSequence,
    },
    Failed {
        reason: FailureReason,
    },
}

impl SessionState {
    /// Attempt in progress (countdown or action)
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::InAction { .. })
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Keep your face inside the frame"),
            Self::Ready { countdown } => write!(f, "Get ready... {}", countdown),
            Self::InAction {
                action,
                remaining_ms,
            } => write!(
                f,
                "{} ({}s)",
                action.instruction,
                remaining_ms.div_ceil(1000)
            ),
            Self::Succeeded { .. } => write!(f, "Liveness verified"),
            Self::Failed {
                reason: FailureReason::FaceLost,
            } => write!(f, "Face was not detected while following the instruction"),
            Self::Failed {
                reason: FailureReason::ActionNotFollowed,
            } => write!(f, "Instruction was not followed correctly, please try again"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stability_state_clamps() {
        assert_eq!(StabilityState::new(42).counter(), 10);
        assert_eq!(StabilityState::new(10).score(), 1.0);
        assert!(!StabilityState::new(4).is_stable());
        assert!(StabilityState::new(5).is_stable());
    }

    #[test]
    fn challenge_sequence_rejects_duplicates() {
        let blink = LivenessAction::from_id(ActionId::Blink);
        let nod = LivenessAction::from_id(ActionId::Nod);
        assert!(ChallengeSequence::new(vec![blink, nod, blink]).is_none());
        assert!(ChallengeSequence::new(vec![]).is_none());
        assert_eq!(
            ChallengeSequence::new(vec![blink, nod]).map(|s| s.ids()),
            Some(vec![ActionId::Blink, ActionId::Nod])
        );
    }

    #[test]
    fn catalog_lookup_matches_ids() {
        for action in LivenessAction::CATALOG {
            assert_eq!(LivenessAction::from_id(action.id), action);
            assert_eq!(action.duration_ms, 4000);
        }
    }

    #[test]
    fn prompt_rounds_remaining_up() {
        let state = SessionState::InAction {
            action: LivenessAction::from_id(ActionId::Smile),
            remaining_ms: 3000,
        };
        assert_eq!(state.to_string(), "Smile (3s)");
        assert_eq!(SessionState::Ready { countdown: 2 }.to_string(), "Get ready... 2");
    }

    #[test]
    fn geofence_message_wording() {
        let site = AllowedSite {
            name: "Main Campus".to_string(),
            center: GeoPoint::new(0.0, 0.0),
            radius_meters: 100.0,
        };
        let inside = GeofenceResult {
            is_valid: true,
            distance_meters: 42.4,
            site: site.clone(),
        };
        assert_eq!(inside.message(), "Inside Main Campus (42 m from center)");

        let outside = GeofenceResult {
            is_valid: false,
            distance_meters: 250.6,
            site,
        };
        assert_eq!(
            outside.message(),
            "251 m from Main Campus, maximum allowed is 100 m"
        );
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert!(!SessionState::default().is_running());
    }

    #[test]
    fn session_state_serializes_with_tag() {
        let json = serde_json::to_value(SessionState::Failed {
            reason: FailureReason::FaceLost,
        })
        .unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "face_lost");
    }
}
