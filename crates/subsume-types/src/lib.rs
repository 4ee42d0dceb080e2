use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized motor speed in `[0, 1]`.
///
/// Behaviors recommend speeds in this range; the actuator driver maps them
/// onto whatever duty cycle or velocity unit the hardware expects.  Values
/// outside the range are clamped at construction, so a `Speed` held anywhere
/// in the system is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed(f32);

impl Speed {
    /// Full speed (1.0), the default when a behavior does not specify one.
    pub const FULL: Speed = Speed(1.0);

    /// Create a speed, clamping to `[0, 1]`.
    pub fn new(value: f32) -> Self {
        Speed(value.clamp(0.0, 1.0))
    }

    /// The inner value, guaranteed to lie in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Speed::FULL
    }
}

/// Strict definition of the motor commands a behavior is allowed to request.
/// `subsume-hal` drivers translate these into wheel currents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum Action {
    /// Halt both wheels.
    Stop,
    /// Drive straight ahead.
    Forward(Speed),
    /// Reverse.
    Backward(Speed),
    /// Pivot left.
    Left(Speed),
    /// Pivot right.
    Right(Speed),
}

impl Action {
    /// The commanded speed, or `None` for [`Action::Stop`].
    pub fn speed(&self) -> Option<Speed> {
        match self {
            Action::Stop => None,
            Action::Forward(s) | Action::Backward(s) | Action::Left(s) | Action::Right(s) => {
                Some(*s)
            }
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Stop => write!(f, "stop"),
            Action::Forward(s) => write!(f, "forward({:.2})", s.value()),
            Action::Backward(s) => write!(f, "backward({:.2})", s.value()),
            Action::Left(s) => write!(f, "left({:.2})", s.value()),
            Action::Right(s) => write!(f, "right({:.2})", s.value()),
        }
    }
}

/// Closed enumeration of the sensor channels the control core understands.
///
/// Each kind appears at most once in a [`SensorSnapshot`]; a kind that is
/// absent from the snapshot was unavailable that cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Ultrasonic range finder, normalized to centimeters.
    Proximity,
    /// Downward-facing IR reflectance array, normalized to ratios in `[0, 1]`
    /// (0.0 = white/line marking, 1.0 = dark floor).
    FloorReflectance,
    /// Camera-derived red-pixel ratio in `[0, 1]`.
    VisionRedRatio,
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Proximity => write!(f, "proximity"),
            SensorKind::FloorReflectance => write!(f, "floor_reflectance"),
            SensorKind::VisionRedRatio => write!(f, "vision_red_ratio"),
        }
    }
}

/// A single normalized sensor reading.
///
/// Normalization is performed by the sensor hub, not by behaviors: a
/// `Reading` stored in a snapshot is already in the units documented on
/// [`SensorKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    /// Distance to the nearest obstacle, in centimeters.
    Distance { cm: f32 },
    /// Ordered reflectance ratios, left to right across the array.
    /// 0.0 = white/line marking, 1.0 = dark floor.
    Reflectance(Vec<f32>),
    /// Fraction of camera pixels classified as red, in `[0, 1]`.
    RedRatio(f32),
}

/// Immutable per-cycle aggregation of all normalized sensor readings.
///
/// Exactly one snapshot exists per control cycle; every behavior evaluates
/// against the same one by shared reference, and it is dropped when the cycle
/// ends.  A [`SensorKind`] missing from the map means that sensor was
/// unavailable (timed out or faulted) this cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSnapshot {
    taken_at: DateTime<Utc>,
    readings: HashMap<SensorKind, Reading>,
}

impl SensorSnapshot {
    /// Build a snapshot from the readings gathered this cycle.
    pub fn new(readings: HashMap<SensorKind, Reading>) -> Self {
        Self {
            taken_at: Utc::now(),
            readings,
        }
    }

    /// Snapshot with no readings at all: every sensor unavailable.
    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// Wall-clock capture time (observability only; pacing uses the
    /// monotonic clock).
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Raw reading for `kind`, if that sensor reported this cycle.
    pub fn get(&self, kind: SensorKind) -> Option<&Reading> {
        self.readings.get(&kind)
    }

    /// `true` if `kind` reported a reading this cycle.
    pub fn is_available(&self, kind: SensorKind) -> bool {
        self.readings.contains_key(&kind)
    }

    /// Proximity distance in centimeters, if available.
    pub fn distance_cm(&self) -> Option<f32> {
        match self.readings.get(&SensorKind::Proximity) {
            Some(Reading::Distance { cm }) => Some(*cm),
            _ => None,
        }
    }

    /// Floor reflectance ratios, if available.
    pub fn reflectance(&self) -> Option<&[f32]> {
        match self.readings.get(&SensorKind::FloorReflectance) {
            Some(Reading::Reflectance(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Camera red-pixel ratio, if available.
    pub fn red_ratio(&self) -> Option<f32> {
        match self.readings.get(&SensorKind::VisionRedRatio) {
            Some(Reading::RedRatio(ratio)) => Some(*ratio),
            _ => None,
        }
    }
}

/// A behavior's confidence that its triggering situation holds this cycle.
///
/// Clamped to `[0, 1]` at construction so downstream weight arithmetic can
/// never go negative or overshoot.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MatchDegree(f32);

impl MatchDegree {
    pub const ZERO: MatchDegree = MatchDegree(0.0);
    pub const FULL: MatchDegree = MatchDegree(1.0);

    /// Create a match degree, clamping to `[0, 1]`.
    pub fn new(value: f32) -> Self {
        MatchDegree(value.clamp(0.0, 1.0))
    }

    /// The inner value, guaranteed to lie in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.0
    }
}

/// Global error type spanning sensor faults, behavior faults, arbitration
/// invariant violations, and actuator failures.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ControlError {
    #[error("sensor '{sensor}' timed out after {timeout_ms} ms")]
    SensorTimeout { sensor: String, timeout_ms: u64 },

    #[error("sensor '{sensor}' fault: {details}")]
    SensorFault { sensor: String, details: String },

    #[error("behavior '{behavior}' evaluation fault: {details}")]
    BehaviorFault { behavior: String, details: String },

    #[error("no behavior selected: every arbitration weight was zero")]
    NoBehaviorSelected,

    #[error("actuator fault on '{component}': {details}")]
    ActuatorFault { component: String, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_clamps_to_unit_interval() {
        assert_eq!(Speed::new(1.5).value(), 1.0);
        assert_eq!(Speed::new(-0.3).value(), 0.0);
        assert_eq!(Speed::new(0.4).value(), 0.4);
        assert_eq!(Speed::default(), Speed::FULL);
    }

    #[test]
    fn match_degree_clamps_to_unit_interval() {
        assert_eq!(MatchDegree::new(2.0).value(), 1.0);
        assert_eq!(MatchDegree::new(-1.0).value(), 0.0);
        assert_eq!(MatchDegree::new(0.8).value(), 0.8);
    }

    #[test]
    fn action_speed_accessor() {
        assert_eq!(Action::Stop.speed(), None);
        assert_eq!(Action::Forward(Speed::new(0.3)).speed(), Some(Speed::new(0.3)));
        assert_eq!(Action::Backward(Speed::FULL).speed(), Some(Speed::FULL));
    }

    #[test]
    fn action_serialization_roundtrip() {
        let action = Action::Backward(Speed::new(0.5));
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn action_stop_roundtrip() {
        let json = serde_json::to_string(&Action::Stop).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Action::Stop));
    }

    #[test]
    fn snapshot_typed_accessors() {
        let mut readings = HashMap::new();
        readings.insert(SensorKind::Proximity, Reading::Distance { cm: 12.5 });
        readings.insert(
            SensorKind::FloorReflectance,
            Reading::Reflectance(vec![0.1, 0.9, 0.9]),
        );
        readings.insert(SensorKind::VisionRedRatio, Reading::RedRatio(0.07));
        let snapshot = SensorSnapshot::new(readings);

        assert_eq!(snapshot.distance_cm(), Some(12.5));
        assert_eq!(snapshot.reflectance(), Some(&[0.1, 0.9, 0.9][..]));
        assert_eq!(snapshot.red_ratio(), Some(0.07));
        assert!(snapshot.is_available(SensorKind::Proximity));
    }

    #[test]
    fn empty_snapshot_reports_everything_unavailable() {
        let snapshot = SensorSnapshot::empty();
        assert_eq!(snapshot.distance_cm(), None);
        assert_eq!(snapshot.reflectance(), None);
        assert_eq!(snapshot.red_ratio(), None);
        assert!(!snapshot.is_available(SensorKind::Proximity));
        assert!(!snapshot.is_available(SensorKind::FloorReflectance));
        assert!(!snapshot.is_available(SensorKind::VisionRedRatio));
    }

    #[test]
    fn snapshot_serialization_roundtrip() {
        let mut readings = HashMap::new();
        readings.insert(SensorKind::Proximity, Reading::Distance { cm: 30.0 });
        let snapshot = SensorSnapshot::new(readings);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SensorSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.distance_cm(), Some(30.0));
        assert_eq!(back.taken_at(), snapshot.taken_at());
    }

    #[test]
    fn control_error_display() {
        let err = ControlError::SensorTimeout {
            sensor: "proximity".to_string(),
            timeout_ms: 50,
        };
        assert!(err.to_string().contains("proximity"));
        assert!(err.to_string().contains("50 ms"));

        let err2 = ControlError::ActuatorFault {
            component: "drive_base".to_string(),
            details: "overcurrent".to_string(),
        };
        assert!(err2.to_string().contains("drive_base"));

        assert!(
            ControlError::NoBehaviorSelected
                .to_string()
                .contains("weight was zero")
        );
    }
}
