//! The polymorphic `Behavior` contract.
//!
//! Concrete behaviors implement this trait and are registered with the
//! controller in a fixed order; that order is significant because the
//! arbitrator breaks weight ties in favour of the first-registered entry.

use subsume_types::{Action, ControlError, MatchDegree, SensorSnapshot};

/// What a behavior proposes for one cycle: how strongly its triggering
/// situation holds, and what the motors should do about it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    /// Confidence in `[0, 1]` that this behavior should act now.
    pub degree: MatchDegree,
    /// The recommended motor command.
    pub action: Action,
}

impl Proposal {
    pub fn new(degree: MatchDegree, action: Action) -> Self {
        Self { degree, action }
    }

    /// A zero-confidence proposal; contributes nothing to arbitration.
    pub fn no_match(action: Action) -> Self {
        Self {
            degree: MatchDegree::ZERO,
            action,
        }
    }
}

/// A self-contained reactive policy evaluated once per control cycle.
///
/// # Contract
///
/// - [`priority`][Behavior::priority] is constant for the behavior's
///   lifetime.
/// - [`evaluate`][Behavior::evaluate] is pure with respect to the snapshot;
///   it may mutate only the behavior's own private state (e.g. a wander
///   RNG advancing) and must not retain the snapshot reference beyond the
///   call.
/// - An `Err` from `evaluate` is caught by the controller at the call site:
///   the behavior contributes match degree 0 for that cycle, the fault is
///   logged, and the loop continues.  Implementations are therefore not
///   required to be failure-tolerant internally.
pub trait Behavior: Send {
    /// Stable display name, e.g. `"obstacle_avoidance"`.
    fn name(&self) -> &str;

    /// Fixed non-negative priority; multiplied by the match degree to rank
    /// competing behaviors.
    fn priority(&self) -> u32;

    /// Evaluate this cycle's snapshot and propose an action.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::BehaviorFault`] on an internal evaluation
    /// failure; the controller degrades the behavior to match degree 0 for
    /// the cycle.
    fn evaluate(&mut self, snapshot: &SensorSnapshot) -> Result<Proposal, ControlError>;
}
