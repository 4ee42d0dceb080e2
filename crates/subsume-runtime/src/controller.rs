//! [`Controller`] – the authoritative control cycle.
//!
//! One single-threaded task runs the phases strictly in sequence, once per
//! cycle:
//!
//! 1. Check the [`CancelFlag`]; if a stop was requested, apply one final
//!    `Stop` and return cleanly.  The check happens *before* the sensor
//!    poll, so at most one full cycle executes after a stop request.
//! 2. [`SensorHub::update`] builds the cycle's one immutable snapshot.
//! 3. Every behavior evaluates the snapshot in registration order.  An
//!    evaluation fault is caught here: the behavior contributes match
//!    degree 0 for the cycle, the fault is logged, the loop continues.
//! 4. The [`Arbitrator`] selects the single winner.  An all-zero table is a
//!    configuration bug and fatal.
//! 5. The winning action goes to the [`ActuatorSink`]; the controller
//!    holds the only handle, so conflicting motor commands are impossible.
//!    An actuator fault is fatal: a best-effort `Stop` is issued and the
//!    loop terminates.
//! 6. The remainder of the cycle period is slept out on the injected
//!    monotonic [`Clock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use subsume_behavior::{Arbitrator, ArbitrationResult, Behavior, Entry};
use subsume_hal::ActuatorSink;
use subsume_types::{Action, ControlError, MatchDegree};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::hub::SensorHub;

// ────────────────────────────────────────────────────────────────────────────
// Cancellation
// ────────────────────────────────────────────────────────────────────────────

/// Cooperative stop signal, checked by the controller at cycle boundaries
/// only.
///
/// Clone the flag and hand it to whatever delivers the external stop signal
/// (a Ctrl-C handler, a supervisor thread); the controller polls it before
/// each sensor update.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop.  The current cycle finishes; one final `Stop` is
    /// issued before the loop returns.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` once a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`Controller`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Minimum wall-clock duration of one cycle; the controller sleeps out
    /// whatever the work phases leave over.
    pub cycle_period: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_millis(500),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

/// The composition root's cycle driver.
///
/// Owns the sensor hub, the behavior set (registration order is significant
/// for tie-breaking), the arbitrator, the clock, and, exclusively, the
/// actuator sink.
pub struct Controller {
    hub: SensorHub,
    behaviors: Vec<Box<dyn Behavior>>,
    arbitrator: Arbitrator,
    sink: Box<dyn ActuatorSink>,
    clock: Box<dyn Clock>,
    config: ControllerConfig,
    cancel: CancelFlag,
    cycles_completed: u64,
}

impl Controller {
    pub fn new(
        hub: SensorHub,
        behaviors: Vec<Box<dyn Behavior>>,
        arbitrator: Arbitrator,
        sink: Box<dyn ActuatorSink>,
        clock: Box<dyn Clock>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            hub,
            behaviors,
            arbitrator,
            sink,
            clock,
            config,
            cancel: CancelFlag::new(),
            cycles_completed: 0,
        }
    }

    /// Replace the stop flag with one created ahead of construction, e.g. a
    /// flag already handed to a signal handler or to a supervising behavior.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// A connected handle to this controller's stop flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Cycles fully executed so far (snapshot through actuation).
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Run cycles until a stop is requested or a fatal fault occurs.
    ///
    /// Returns the number of completed cycles on a clean shutdown.
    ///
    /// # Errors
    ///
    /// Propagates [`ControlError::NoBehaviorSelected`] and
    /// [`ControlError::ActuatorFault`] from [`tick`][Self::tick]; in both
    /// cases a best-effort `Stop` has already been issued.
    pub fn run(&mut self) -> Result<u64, ControlError> {
        loop {
            // Cancellation is checked before the sensor poll, so at most one
            // more full cycle can execute after a stop request.
            if self.cancel.is_stop_requested() {
                info!(cycles = self.cycles_completed, "stop requested; halting");
                self.best_effort_stop();
                return Ok(self.cycles_completed);
            }

            let cycle_start = self.clock.now();
            self.tick()?;

            let elapsed = self.clock.now().saturating_sub(cycle_start);
            if let Some(remainder) = self.config.cycle_period.checked_sub(elapsed) {
                self.clock.sleep(remainder);
            }
        }
    }

    /// Execute exactly one cycle: sense, evaluate, arbitrate, actuate.
    /// No pacing and no cancellation check; [`run`][Self::run] owns those.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NoBehaviorSelected`] if every weight is zero
    /// and [`ControlError::ActuatorFault`] if the sink rejects the action.
    /// Both are fatal; a best-effort `Stop` has been issued before the
    /// error is returned.
    pub fn tick(&mut self) -> Result<ArbitrationResult, ControlError> {
        let snapshot = self.hub.update();

        let mut entries = Vec::with_capacity(self.behaviors.len());
        for behavior in &mut self.behaviors {
            let entry = match behavior.evaluate(&snapshot) {
                Ok(proposal) => Entry::new(
                    behavior.name(),
                    behavior.priority(),
                    proposal.degree,
                    proposal.action,
                ),
                Err(err) => {
                    warn!(
                        behavior = behavior.name(),
                        error = %err,
                        "behavior evaluation fault; contributing zero match for this cycle"
                    );
                    Entry::new(
                        behavior.name(),
                        behavior.priority(),
                        MatchDegree::ZERO,
                        Action::Stop,
                    )
                }
            };
            entries.push(entry);
        }

        let result = match self.arbitrator.select(&entries) {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "arbitration failed; halting");
                self.best_effort_stop();
                return Err(err);
            }
        };

        debug!(winner = %result.winner, action = %result.action, "cycle arbitrated");

        if let Err(err) = self.sink.apply(&result.action) {
            error!(error = %err, "actuator fault; halting");
            self.best_effort_stop();
            return Err(err);
        }

        self.cycles_completed += 1;
        Ok(result)
    }

    /// Issue a `Stop`; failure is logged, not propagated.  Used on the
    /// shutdown paths where the loop is ending regardless.
    fn best_effort_stop(&mut self) {
        if let Err(err) = self.sink.apply(&Action::Stop) {
            error!(error = %err, "failed to issue final stop");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use subsume_behavior::{
        DefaultWander, LineGuard, ObstacleAvoidance, Proposal, TargetSeek,
    };
    use subsume_hal::{CameraFrame, RawSample, SensorSource, SimDrive, SimRig, SimSensor};
    use subsume_types::{SensorKind, SensorSnapshot, Speed};

    use crate::clock::FakeClock;

    fn standard_behaviors() -> Vec<Box<dyn Behavior>> {
        vec![
            Box::new(ObstacleAvoidance::new()),
            Box::new(LineGuard::new()),
            Box::new(TargetSeek::new()),
            Box::new(DefaultWander::new(7)),
        ]
    }

    fn controller_with(
        sensors: Vec<Box<dyn SensorSource>>,
        behaviors: Vec<Box<dyn Behavior>>,
        drive: SimDrive,
    ) -> Controller {
        Controller::new(
            SensorHub::new(sensors),
            behaviors,
            Arbitrator::max_weight(),
            Box::new(drive),
            Box::new(FakeClock::new()),
            ControllerConfig::default(),
        )
    }

    /// Counts polls so tests can assert the hub was not consulted.
    struct CountingSensor {
        polls: Arc<AtomicUsize>,
    }

    impl SensorSource for CountingSensor {
        fn kind(&self) -> SensorKind {
            SensorKind::Proximity
        }

        fn poll(&mut self, _timeout: Duration) -> Result<RawSample, ControlError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(RawSample::DistanceCm(100.0))
        }
    }

    /// Requests a stop from inside its first evaluation, simulating an
    /// external signal arriving mid-cycle.
    struct StopRequester {
        flag: CancelFlag,
    }

    impl Behavior for StopRequester {
        fn name(&self) -> &str {
            "stop_requester"
        }

        fn priority(&self) -> u32 {
            0
        }

        fn evaluate(&mut self, _snapshot: &SensorSnapshot) -> Result<Proposal, ControlError> {
            self.flag.request_stop();
            Ok(Proposal::no_match(Action::Stop))
        }
    }

    struct FaultyBehavior;

    impl Behavior for FaultyBehavior {
        fn name(&self) -> &str {
            "faulty"
        }

        fn priority(&self) -> u32 {
            100
        }

        fn evaluate(&mut self, _snapshot: &SensorSnapshot) -> Result<Proposal, ControlError> {
            Err(ControlError::BehaviorFault {
                behavior: "faulty".to_string(),
                details: "synthetic failure".to_string(),
            })
        }
    }

    #[test]
    fn obstacle_wins_end_to_end() {
        // Expected table: obstacle 3×1=3, line 2×1=2, seek 0, wander 0.1.
        let (sensors, drive, log) = SimRig::new()
            .with_proximity_cm(5.0)
            .with_reflectance_counts(vec![100, 1800, 1800]) // 0.05 < 0.2 → line triggers
            .with_camera_frame(CameraFrame {
                width: 1,
                height: 1,
                data: vec![120, 120, 120], // no red → seek silent
            })
            .build();

        let behaviors: Vec<Box<dyn Behavior>> = vec![
            Box::new(ObstacleAvoidance::new().with_priority(3)),
            Box::new(LineGuard::new().with_priority(2)),
            Box::new(TargetSeek::new()),
            Box::new(DefaultWander::new(7)),
        ];

        let mut controller = controller_with(sensors, behaviors, drive);
        let result = controller.tick().unwrap();

        assert_eq!(result.winner, "obstacle_avoidance");
        assert_eq!(log.last(), Some(Action::Backward(Speed::FULL)));

        let weight_of = |name: &str| {
            result
                .weights
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, w)| *w)
                .unwrap()
        };
        assert!((weight_of("obstacle_avoidance") - 3.0).abs() < 1e-6);
        assert!((weight_of("line_guard") - 2.0).abs() < 1e-6);
        assert_eq!(weight_of("target_seek"), 0.0);
        assert!((weight_of("default_wander") - 0.1).abs() < 1e-6);
    }

    #[test]
    fn all_sensors_unavailable_only_wander_can_win() {
        let sensors: Vec<Box<dyn SensorSource>> = vec![
            SimSensor::unavailable(SensorKind::Proximity),
            SimSensor::unavailable(SensorKind::FloorReflectance),
            SimSensor::unavailable(SensorKind::VisionRedRatio),
        ];
        let mut controller = controller_with(sensors, standard_behaviors(), SimDrive::new());

        for _ in 0..5 {
            assert_eq!(controller.tick().unwrap().winner, "default_wander");
        }
    }

    #[test]
    fn behavior_fault_degrades_to_zero_and_loop_continues() {
        let behaviors: Vec<Box<dyn Behavior>> = vec![
            Box::new(FaultyBehavior), // would dominate at priority 100
            Box::new(DefaultWander::new(7)),
        ];
        let mut controller = controller_with(vec![], behaviors, SimDrive::new());

        let result = controller.tick().unwrap();
        assert_eq!(result.winner, "default_wander");
        assert_eq!(controller.cycles_completed(), 1);
    }

    #[test]
    fn all_zero_table_is_fatal_and_stops_the_motors() {
        // No wander registered: a configuration bug.
        let behaviors: Vec<Box<dyn Behavior>> = vec![Box::new(ObstacleAvoidance::new())];
        let drive = SimDrive::new();
        let log = drive.log();
        let mut controller = controller_with(vec![], behaviors, drive);

        let err = controller.tick().unwrap_err();
        assert!(matches!(err, ControlError::NoBehaviorSelected));
        assert_eq!(log.snapshot(), vec![Action::Stop]);
        assert_eq!(controller.cycles_completed(), 0);
    }

    #[test]
    fn actuator_fault_is_fatal_with_best_effort_stop() {
        let drive = SimDrive::new().fail_on_apply(1);
        let log = drive.log();
        let mut controller = controller_with(vec![], standard_behaviors(), drive);

        let err = controller.tick().unwrap_err();
        assert!(matches!(err, ControlError::ActuatorFault { .. }));
        // The winning action never landed; the best-effort stop did.
        assert_eq!(log.snapshot(), vec![Action::Stop]);
    }

    #[test]
    fn pre_requested_stop_issues_one_stop_and_never_polls() {
        let polls = Arc::new(AtomicUsize::new(0));
        let sensors: Vec<Box<dyn SensorSource>> = vec![Box::new(CountingSensor {
            polls: Arc::clone(&polls),
        })];
        let drive = SimDrive::new();
        let log = drive.log();
        let mut controller = controller_with(sensors, standard_behaviors(), drive);

        controller.cancel_flag().request_stop();
        let cycles = controller.run().unwrap();

        assert_eq!(cycles, 0);
        assert_eq!(log.snapshot(), vec![Action::Stop]);
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn externally_supplied_cancel_flag_is_observed() {
        let flag = CancelFlag::new();
        flag.request_stop();

        let mut controller = controller_with(vec![], standard_behaviors(), SimDrive::new())
            .with_cancel_flag(flag);
        assert_eq!(controller.run().unwrap(), 0);
    }

    #[test]
    fn mid_run_stop_finishes_the_cycle_then_halts() {
        let polls = Arc::new(AtomicUsize::new(0));
        let sensors: Vec<Box<dyn SensorSource>> = vec![Box::new(CountingSensor {
            polls: Arc::clone(&polls),
        })];
        let drive = SimDrive::new();
        let log = drive.log();

        let flag = CancelFlag::new();
        let behaviors: Vec<Box<dyn Behavior>> = vec![
            Box::new(StopRequester { flag: flag.clone() }),
            Box::new(DefaultWander::new(7)),
        ];
        let mut controller = Controller::new(
            SensorHub::new(sensors),
            behaviors,
            Arbitrator::max_weight(),
            Box::new(drive),
            Box::new(FakeClock::new()),
            ControllerConfig::default(),
        )
        .with_cancel_flag(flag);

        let cycles = controller.run().unwrap();

        // The cycle in which the stop arrived completed fully, then exactly
        // one final Stop went out and the sensors were never polled again.
        assert_eq!(cycles, 1);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
        let actions = log.snapshot();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1], Action::Stop);
        assert!(matches!(
            actions[0],
            Action::Forward(_) | Action::Left(_) | Action::Right(_)
        ));
    }

    /// A [`FakeClock`] behind a shared handle, so tests can inspect the
    /// recorded sleeps after the clock moves into the controller.
    #[derive(Clone, Default)]
    struct SharedClock(Arc<std::sync::Mutex<FakeClock>>);

    impl SharedClock {
        fn sleeps(&self) -> Vec<Duration> {
            self.0.lock().unwrap().sleeps().to_vec()
        }
    }

    impl Clock for SharedClock {
        fn now(&self) -> Duration {
            self.0.lock().unwrap().now()
        }

        fn sleep(&mut self, duration: Duration) {
            self.0.lock().unwrap().sleep(duration);
        }
    }

    #[test]
    fn pacing_sleeps_out_the_cycle_remainder() {
        let clock = SharedClock::default();
        let flag = CancelFlag::new();
        let behaviors: Vec<Box<dyn Behavior>> = vec![
            Box::new(StopRequester { flag: flag.clone() }),
            Box::new(DefaultWander::new(7)),
        ];
        let mut controller = Controller::new(
            SensorHub::new(vec![]),
            behaviors,
            Arbitrator::max_weight(),
            Box::new(SimDrive::new()),
            Box::new(clock.clone()),
            ControllerConfig {
                cycle_period: Duration::from_millis(500),
            },
        )
        .with_cancel_flag(flag);

        controller.run().unwrap();

        // One paced cycle ran; the fake clock does no work, so the whole
        // period was slept out.
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
    }
}
