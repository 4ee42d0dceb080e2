//! The four built-in behaviors.
//!
//! Thresholds and priorities default to the values the robot shipped with;
//! every one is overridable through the constructors so the composition
//! root can apply configured values.
//!
//! | Behavior             | Default priority | Trigger |
//! |----------------------|------------------|---------|
//! | [`LineGuard`]        | 3 (high)         | any reflectance ratio below the line threshold |
//! | [`ObstacleAvoidance`]| 2 (medium)       | proximity below the obstacle threshold |
//! | [`TargetSeek`]       | 2 (medium)       | red-pixel ratio above the red threshold |
//! | [`DefaultWander`]    | 1 (low)          | always, at a constant 0.1 baseline |

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use subsume_types::{Action, ControlError, MatchDegree, SensorSnapshot, Speed};

use crate::behavior::{Behavior, Proposal};

// ────────────────────────────────────────────────────────────────────────────
// ObstacleAvoidance
// ────────────────────────────────────────────────────────────────────────────

/// Backs away from obstacles the ultrasonic ranger reports inside the
/// threshold distance.
///
/// With proximity unavailable the match degree is 0; the behavior degrades
/// silently instead of guessing.
pub struct ObstacleAvoidance {
    priority: u32,
    threshold_cm: f32,
}

impl ObstacleAvoidance {
    pub const DEFAULT_THRESHOLD_CM: f32 = 15.0;

    /// Obstacle avoidance with the default 15 cm threshold and priority 2.
    pub fn new() -> Self {
        Self {
            priority: 2,
            threshold_cm: Self::DEFAULT_THRESHOLD_CM,
        }
    }

    pub fn with_threshold_cm(mut self, threshold_cm: f32) -> Self {
        self.threshold_cm = threshold_cm;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for ObstacleAvoidance {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for ObstacleAvoidance {
    fn name(&self) -> &str {
        "obstacle_avoidance"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&mut self, snapshot: &SensorSnapshot) -> Result<Proposal, ControlError> {
        let action = Action::Backward(Speed::FULL);
        let degree = match snapshot.distance_cm() {
            Some(cm) if cm < self.threshold_cm => MatchDegree::FULL,
            Some(_) => MatchDegree::ZERO,
            None => MatchDegree::ZERO,
        };
        Ok(Proposal::new(degree, action))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LineGuard
// ────────────────────────────────────────────────────────────────────────────

/// Keeps the robot inside the arena's boundary line.
///
/// The floor array reads near 0.0 over the white boundary tape and near 1.0
/// over the dark floor; any single element below the line threshold means a
/// wheel is about to cross, so the behavior demands a full-speed reverse,
/// regardless of every other sensor.
pub struct LineGuard {
    priority: u32,
    line_threshold: f32,
}

impl LineGuard {
    pub const DEFAULT_LINE_THRESHOLD: f32 = 0.2;

    /// Line guard with the default 0.2 threshold and priority 3.
    pub fn new() -> Self {
        Self {
            priority: 3,
            line_threshold: Self::DEFAULT_LINE_THRESHOLD,
        }
    }

    pub fn with_line_threshold(mut self, line_threshold: f32) -> Self {
        self.line_threshold = line_threshold;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for LineGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for LineGuard {
    fn name(&self) -> &str {
        "line_guard"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&mut self, snapshot: &SensorSnapshot) -> Result<Proposal, ControlError> {
        let action = Action::Backward(Speed::FULL);
        let degree = match snapshot.reflectance() {
            Some(readings) if !readings.is_empty() => {
                let min = readings.iter().copied().fold(f32::INFINITY, f32::min);
                if min < self.line_threshold {
                    MatchDegree::FULL
                } else {
                    MatchDegree::ZERO
                }
            }
            _ => MatchDegree::ZERO,
        };
        Ok(Proposal::new(degree, action))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TargetSeek
// ────────────────────────────────────────────────────────────────────────────

/// Drives toward red targets the camera reports.
///
/// The match degree is a fixed 0.8 whenever the red ratio clears the
/// threshold: seeking is deliberately weaker than the two safety behaviors
/// at equal priority.  Speed follows how much of the view is red: a
/// dominant target (ratio ≥ 0.5) gets full speed, a distant one 0.3.
pub struct TargetSeek {
    priority: u32,
    red_threshold: f32,
}

impl TargetSeek {
    pub const DEFAULT_RED_THRESHOLD: f32 = 0.05;
    const MATCH_DEGREE: f32 = 0.8;
    const NEAR_RATIO: f32 = 0.5;
    const FAR_SPEED: f32 = 0.3;

    /// Target seeking with the default 0.05 red threshold and priority 2.
    pub fn new() -> Self {
        Self {
            priority: 2,
            red_threshold: Self::DEFAULT_RED_THRESHOLD,
        }
    }

    pub fn with_red_threshold(mut self, red_threshold: f32) -> Self {
        self.red_threshold = red_threshold;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for TargetSeek {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for TargetSeek {
    fn name(&self) -> &str {
        "target_seek"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&mut self, snapshot: &SensorSnapshot) -> Result<Proposal, ControlError> {
        match snapshot.red_ratio() {
            Some(ratio) if ratio > self.red_threshold => {
                let speed = if ratio >= Self::NEAR_RATIO {
                    Speed::FULL
                } else {
                    Speed::new(Self::FAR_SPEED)
                };
                Ok(Proposal::new(
                    MatchDegree::new(Self::MATCH_DEGREE),
                    Action::Forward(speed),
                ))
            }
            _ => Ok(Proposal::no_match(Action::Forward(Speed::new(
                Self::FAR_SPEED,
            )))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DefaultWander
// ────────────────────────────────────────────────────────────────────────────

/// The fallback that keeps the robot moving when nothing else triggers.
///
/// Always registered last, always matching at a constant positive baseline,
/// so the arbitration table can never be all-zero.  The action is drawn
/// from {forward, left, right} by a seeded RNG: the same seed always
/// produces the same wander sequence, which tests rely on.
pub struct DefaultWander {
    priority: u32,
    baseline: MatchDegree,
    rng: SmallRng,
}

impl DefaultWander {
    pub const DEFAULT_BASELINE: f32 = 0.1;

    const CHOICES: [Action; 3] = [
        Action::Forward(Speed::FULL),
        Action::Left(Speed::FULL),
        Action::Right(Speed::FULL),
    ];

    /// Wander with the default 0.1 baseline and priority 1, seeded for a
    /// reproducible action sequence.
    pub fn new(seed: u64) -> Self {
        Self {
            priority: 1,
            baseline: MatchDegree::new(Self::DEFAULT_BASELINE),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_baseline(mut self, baseline: f32) -> Self {
        self.baseline = MatchDegree::new(baseline);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Behavior for DefaultWander {
    fn name(&self) -> &str {
        "default_wander"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn evaluate(&mut self, _snapshot: &SensorSnapshot) -> Result<Proposal, ControlError> {
        // The RNG advancing is this behavior's only mutable state.
        let action = *Self::CHOICES
            .choose(&mut self.rng)
            .expect("choices array is non-empty");
        Ok(Proposal::new(self.baseline, action))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use subsume_types::{Reading, SensorKind};

    fn snapshot_with(readings: Vec<(SensorKind, Reading)>) -> SensorSnapshot {
        SensorSnapshot::new(readings.into_iter().collect::<HashMap<_, _>>())
    }

    #[test]
    fn obstacle_avoidance_triggers_inside_threshold() {
        let mut b = ObstacleAvoidance::new();
        let snap = snapshot_with(vec![(SensorKind::Proximity, Reading::Distance { cm: 5.0 })]);
        let p = b.evaluate(&snap).unwrap();
        assert_eq!(p.degree, MatchDegree::FULL);
        assert_eq!(p.action, Action::Backward(Speed::FULL));
    }

    #[test]
    fn obstacle_avoidance_silent_outside_threshold() {
        let mut b = ObstacleAvoidance::new();
        let snap = snapshot_with(vec![(SensorKind::Proximity, Reading::Distance { cm: 50.0 })]);
        assert_eq!(b.evaluate(&snap).unwrap().degree, MatchDegree::ZERO);
    }

    #[test]
    fn obstacle_avoidance_degrades_without_proximity() {
        let mut b = ObstacleAvoidance::new();
        let p = b.evaluate(&SensorSnapshot::empty()).unwrap();
        assert_eq!(p.degree, MatchDegree::ZERO);
    }

    #[test]
    fn obstacle_avoidance_boundary_is_exclusive() {
        // distance == threshold does not trigger.
        let mut b = ObstacleAvoidance::new().with_threshold_cm(15.0);
        let snap = snapshot_with(vec![(SensorKind::Proximity, Reading::Distance { cm: 15.0 })]);
        assert_eq!(b.evaluate(&snap).unwrap().degree, MatchDegree::ZERO);
    }

    #[test]
    fn line_guard_triggers_on_single_low_reading() {
        let mut b = LineGuard::new();
        let snap = snapshot_with(vec![
            (
                SensorKind::FloorReflectance,
                Reading::Reflectance(vec![0.1, 0.9, 0.9, 0.9]),
            ),
            // Other sensors must not matter.
            (SensorKind::Proximity, Reading::Distance { cm: 5.0 }),
            (SensorKind::VisionRedRatio, Reading::RedRatio(0.9)),
        ]);
        let p = b.evaluate(&snap).unwrap();
        assert_eq!(p.degree, MatchDegree::FULL);
        assert_eq!(p.action, Action::Backward(Speed::FULL));
    }

    #[test]
    fn line_guard_silent_over_dark_floor() {
        let mut b = LineGuard::new();
        let snap = snapshot_with(vec![(
            SensorKind::FloorReflectance,
            Reading::Reflectance(vec![0.8, 0.9, 0.95]),
        )]);
        assert_eq!(b.evaluate(&snap).unwrap().degree, MatchDegree::ZERO);
    }

    #[test]
    fn line_guard_degrades_without_array() {
        let mut b = LineGuard::new();
        assert_eq!(
            b.evaluate(&SensorSnapshot::empty()).unwrap().degree,
            MatchDegree::ZERO
        );
        // An empty array is as good as no array.
        let snap = snapshot_with(vec![(
            SensorKind::FloorReflectance,
            Reading::Reflectance(vec![]),
        )]);
        assert_eq!(b.evaluate(&snap).unwrap().degree, MatchDegree::ZERO);
    }

    #[test]
    fn target_seek_full_speed_on_dominant_target() {
        let mut b = TargetSeek::new();
        let snap = snapshot_with(vec![(SensorKind::VisionRedRatio, Reading::RedRatio(0.6))]);
        let p = b.evaluate(&snap).unwrap();
        assert_eq!(p.degree, MatchDegree::new(0.8));
        assert_eq!(p.action, Action::Forward(Speed::FULL));
    }

    #[test]
    fn target_seek_full_speed_at_half_view() {
        let mut b = TargetSeek::new();
        let snap = snapshot_with(vec![(SensorKind::VisionRedRatio, Reading::RedRatio(0.5))]);
        let p = b.evaluate(&snap).unwrap();
        assert_eq!(p.degree, MatchDegree::new(0.8));
        assert_eq!(p.action, Action::Forward(Speed::FULL));
    }

    #[test]
    fn target_seek_slow_approach_on_distant_target() {
        let mut b = TargetSeek::new();
        let snap = snapshot_with(vec![(SensorKind::VisionRedRatio, Reading::RedRatio(0.2))]);
        let p = b.evaluate(&snap).unwrap();
        assert_eq!(p.degree, MatchDegree::new(0.8));
        assert_eq!(p.action, Action::Forward(Speed::new(0.3)));
    }

    #[test]
    fn target_seek_silent_below_threshold() {
        let mut b = TargetSeek::new();
        let snap = snapshot_with(vec![(SensorKind::VisionRedRatio, Reading::RedRatio(0.01))]);
        assert_eq!(b.evaluate(&snap).unwrap().degree, MatchDegree::ZERO);
    }

    #[test]
    fn target_seek_degrades_without_camera() {
        let mut b = TargetSeek::new();
        assert_eq!(
            b.evaluate(&SensorSnapshot::empty()).unwrap().degree,
            MatchDegree::ZERO
        );
    }

    #[test]
    fn wander_always_matches_at_baseline() {
        let mut b = DefaultWander::new(7);
        let p = b.evaluate(&SensorSnapshot::empty()).unwrap();
        assert_eq!(p.degree, MatchDegree::new(0.1));
        assert!(matches!(
            p.action,
            Action::Forward(_) | Action::Left(_) | Action::Right(_)
        ));
    }

    #[test]
    fn wander_sequence_is_reproducible_under_seeding() {
        let snap = SensorSnapshot::empty();
        let mut a = DefaultWander::new(1234);
        let mut b = DefaultWander::new(1234);
        for _ in 0..20 {
            assert_eq!(
                a.evaluate(&snap).unwrap().action,
                b.evaluate(&snap).unwrap().action
            );
        }
    }

    #[test]
    fn wander_visits_more_than_one_action() {
        let snap = SensorSnapshot::empty();
        let mut b = DefaultWander::new(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            seen.insert(format!("{}", b.evaluate(&snap).unwrap().action));
        }
        assert!(seen.len() > 1, "wander must not be stuck on one action");
    }
}
