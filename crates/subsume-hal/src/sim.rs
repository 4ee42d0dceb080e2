//! In-process simulation drivers for CI testing without physical hardware.
//!
//! [`SimSensor`] plays back a script of poll outcomes, [`SimDrive`] records
//! every applied [`Action`] into a shared log, and [`SimRig`] assembles a
//! complete headless rig.  This lets the full control stack (hub, behaviors,
//! arbitrator, controller) run in tests and CI pipelines with no robot
//! attached.
//!
//! # Example
//!
//! ```rust
//! use subsume_hal::sim::SimRig;
//! use subsume_hal::actuator::ActuatorSink;
//!
//! let (sensors, drive, log) = SimRig::new()
//!     .with_proximity_cm(5.0)
//!     .with_reflectance_counts(vec![1800, 1900, 1850])
//!     .build();
//!
//! assert_eq!(sensors.len(), 2);
//! assert_eq!(drive.id(), "sim_drive");
//! assert!(log.snapshot().is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subsume_types::{Action, ControlError, SensorKind};
use tracing::debug;

use crate::actuator::ActuatorSink;
use crate::sensor::{CameraFrame, RawSample, SensorSource};

// ────────────────────────────────────────────────────────────────────────────
// Action log
// ────────────────────────────────────────────────────────────────────────────

/// Shared record of every action a [`SimDrive`] has applied.
///
/// Clone the log before moving the drive into the controller; the clone
/// stays connected and can be inspected after the run.
#[derive(Debug, Clone, Default)]
pub struct ActionLog(Arc<Mutex<Vec<Action>>>);

impl ActionLog {
    /// A copy of all actions applied so far, in order.
    pub fn snapshot(&self) -> Vec<Action> {
        self.0.lock().expect("action log poisoned").clone()
    }

    /// The most recently applied action, if any.
    pub fn last(&self) -> Option<Action> {
        self.0.lock().expect("action log poisoned").last().copied()
    }

    fn push(&self, action: Action) {
        self.0.lock().expect("action log poisoned").push(action);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted sensor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated sensor that plays back a script of poll outcomes.
///
/// Once the script is exhausted the sensor replays its steady fallback
/// sample, or times out on every poll if none was configured.
pub struct SimSensor {
    kind: SensorKind,
    script: VecDeque<Result<RawSample, ControlError>>,
    fallback: Option<RawSample>,
}

impl SimSensor {
    /// A sensor that returns `sample` on every poll.
    pub fn steady(kind: SensorKind, sample: RawSample) -> Box<Self> {
        Box::new(Self {
            kind,
            script: VecDeque::new(),
            fallback: Some(sample),
        })
    }

    /// A sensor that plays back `outcomes` in order, then times out.
    pub fn scripted(
        kind: SensorKind,
        outcomes: impl IntoIterator<Item = Result<RawSample, ControlError>>,
    ) -> Box<Self> {
        Box::new(Self {
            kind,
            script: outcomes.into_iter().collect(),
            fallback: None,
        })
    }

    /// A sensor whose every poll times out: a permanently absent device.
    pub fn unavailable(kind: SensorKind) -> Box<Self> {
        Box::new(Self {
            kind,
            script: VecDeque::new(),
            fallback: None,
        })
    }
}

impl SensorSource for SimSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn poll(&mut self, timeout: Duration) -> Result<RawSample, ControlError> {
        if let Some(outcome) = self.script.pop_front() {
            return outcome;
        }
        match &self.fallback {
            Some(sample) => Ok(sample.clone()),
            None => Err(ControlError::SensorTimeout {
                sensor: self.kind.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recording drive
// ────────────────────────────────────────────────────────────────────────────

/// A simulated motor drive that records every applied action.
///
/// An optional injected fault makes the Nth apply (1-based) fail, for
/// exercising the controller's fatal-fault path.
pub struct SimDrive {
    id: String,
    log: ActionLog,
    applies: usize,
    fail_on_apply: Option<usize>,
}

impl SimDrive {
    /// Create a drive named `"sim_drive"` with a fresh action log.
    pub fn new() -> Self {
        Self {
            id: "sim_drive".to_string(),
            log: ActionLog::default(),
            applies: 0,
            fail_on_apply: None,
        }
    }

    /// Make the `n`th call to [`apply`][ActuatorSink::apply] (1-based)
    /// return an [`ControlError::ActuatorFault`].
    pub fn fail_on_apply(mut self, n: usize) -> Self {
        self.fail_on_apply = Some(n);
        self
    }

    /// A connected handle to this drive's action log.
    pub fn log(&self) -> ActionLog {
        self.log.clone()
    }
}

impl Default for SimDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorSink for SimDrive {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, action: &Action) -> Result<(), ControlError> {
        self.applies += 1;
        if self.fail_on_apply == Some(self.applies) {
            return Err(ControlError::ActuatorFault {
                component: self.id.clone(),
                details: format!("injected fault on apply #{}", self.applies),
            });
        }
        debug!(drive = %self.id, %action, "applied");
        self.log.push(*action);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRig builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that assembles a complete simulated rig: steady sensors plus a
/// recording drive.
///
/// Call the `with_*` methods for the channels you need, then
/// [`build`][Self::build] to obtain the sensor set, the drive, and a
/// connected [`ActionLog`].
#[derive(Default)]
pub struct SimRig {
    sensors: Vec<Box<dyn SensorSource>>,
    drive: Option<SimDrive>,
}

impl SimRig {
    /// Create an empty rig builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a steady ultrasonic ranger reporting `cm` on every poll.
    pub fn with_proximity_cm(mut self, cm: f32) -> Self {
        self.sensors
            .push(SimSensor::steady(SensorKind::Proximity, RawSample::DistanceCm(cm)));
        self
    }

    /// Add a steady IR reflectance array reporting `counts` on every poll.
    pub fn with_reflectance_counts(mut self, counts: Vec<u16>) -> Self {
        self.sensors.push(SimSensor::steady(
            SensorKind::FloorReflectance,
            RawSample::ReflectanceCounts(counts),
        ));
        self
    }

    /// Add a steady camera returning `frame` on every poll.
    pub fn with_camera_frame(mut self, frame: CameraFrame) -> Self {
        self.sensors
            .push(SimSensor::steady(SensorKind::VisionRedRatio, RawSample::Frame(frame)));
        self
    }

    /// Add a custom sensor driver, e.g. a scripted [`SimSensor`] for
    /// asserting on degradation behavior.
    pub fn with_sensor(mut self, sensor: Box<dyn SensorSource>) -> Self {
        self.sensors.push(sensor);
        self
    }

    /// Replace the default drive, e.g. with one carrying an injected fault.
    pub fn with_drive(mut self, drive: SimDrive) -> Self {
        self.drive = Some(drive);
        self
    }

    /// Consume the builder and return the sensor set, the drive, and a
    /// connected action log.
    pub fn build(self) -> (Vec<Box<dyn SensorSource>>, SimDrive, ActionLog) {
        let drive = self.drive.unwrap_or_default();
        let log = drive.log();
        (self.sensors, drive, log)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
