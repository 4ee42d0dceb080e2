//! Single-winner arbitration over competing behavior proposals.
//!
//! Every cycle each behavior contributes an [`Entry`]; the arbitrator
//! computes `weight = priority × match_degree` per entry and selects exactly
//! one winner under the policy it was constructed with.  The two policies
//! are never mixed: an [`Arbitrator`] runs one of them for its whole
//! lifetime.
//!
//! # Tie-breaking
//!
//! Under [`ArbitrationPolicy::MaxWeight`] equal weights keep the
//! first-registered entry.  This determinism is a contract, not an
//! implementation detail; registration order is how the composition root
//! expresses precedence among equally-weighted behaviors.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use subsume_types::{Action, ControlError, MatchDegree};
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// How the arbitrator picks the winning behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArbitrationPolicy {
    /// The entry with the largest weight wins; ties go to the
    /// first-registered entry.
    MaxWeight,
    /// The winner is drawn by cumulative-range sampling proportional to
    /// weight, from an RNG seeded with `seed`.  Zero-weight entries have
    /// zero probability of being drawn.
    WeightedRandom { seed: u64 },
}

/// One behavior's contribution to a cycle's arbitration.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The behavior's stable name.
    pub name: String,
    /// The behavior's fixed priority.
    pub priority: u32,
    /// This cycle's match degree.
    pub degree: MatchDegree,
    /// The action the behavior recommends.
    pub action: Action,
}

impl Entry {
    pub fn new(name: impl Into<String>, priority: u32, degree: MatchDegree, action: Action) -> Self {
        Self {
            name: name.into(),
            priority,
            degree,
            action,
        }
    }

    /// `priority × match_degree`; always ≥ 0.
    pub fn weight(&self) -> f32 {
        self.priority as f32 * self.degree.value()
    }
}

/// The outcome of one arbitration round.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationResult {
    /// Name of the winning behavior.
    pub winner: String,
    /// The winning behavior's action, to be applied to the actuator sink.
    pub action: Action,
    /// The full `(name, weight)` table, in registration order, for
    /// observability and tests.
    pub weights: Vec<(String, f32)>,
}

// ────────────────────────────────────────────────────────────────────────────
// Arbitrator
// ────────────────────────────────────────────────────────────────────────────

/// Selects exactly one winning behavior per cycle.
///
/// Construct with [`Arbitrator::max_weight`] or
/// [`Arbitrator::weighted_random`]; call [`Arbitrator::select`] once per
/// cycle with the entries in behavior registration order.
pub struct Arbitrator {
    policy: ArbitrationPolicy,
    /// Present only under `WeightedRandom`; owned so repeated draws advance
    /// one reproducible stream.
    rng: Option<SmallRng>,
}

impl Arbitrator {
    pub fn new(policy: ArbitrationPolicy) -> Self {
        let rng = match policy {
            ArbitrationPolicy::MaxWeight => None,
            ArbitrationPolicy::WeightedRandom { seed } => Some(SmallRng::seed_from_u64(seed)),
        };
        Self { policy, rng }
    }

    /// Deterministic max-weight arbitration (the default policy).
    pub fn max_weight() -> Self {
        Self::new(ArbitrationPolicy::MaxWeight)
    }

    /// Weighted-random arbitration with a reproducible seed.
    pub fn weighted_random(seed: u64) -> Self {
        Self::new(ArbitrationPolicy::WeightedRandom { seed })
    }

    pub fn policy(&self) -> ArbitrationPolicy {
        self.policy
    }

    /// Pick this cycle's winner.
    ///
    /// `entries` must be in behavior registration order.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NoBehaviorSelected`] when the entry list is
    /// empty or every weight is zero.  With a correctly registered
    /// `DefaultWander` this cannot occur; the controller treats it as a
    /// fatal configuration bug.
    pub fn select(&mut self, entries: &[Entry]) -> Result<ArbitrationResult, ControlError> {
        let weights: Vec<(String, f32)> = entries
            .iter()
            .map(|e| (e.name.clone(), e.weight()))
            .collect();
        debug!(?weights, "arbitration table");

        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        if entries.is_empty() || total <= 0.0 {
            return Err(ControlError::NoBehaviorSelected);
        }

        let winner = match &mut self.rng {
            None => Self::pick_max(entries),
            Some(rng) => Self::pick_weighted(entries, rng.gen_range(0.0..total)),
        };

        Ok(ArbitrationResult {
            winner: winner.name.clone(),
            action: winner.action,
            weights,
        })
    }

    /// Largest weight wins; strict comparison keeps the first-registered
    /// entry on ties.
    fn pick_max(entries: &[Entry]) -> &Entry {
        let mut best = &entries[0];
        for entry in &entries[1..] {
            if entry.weight() > best.weight() {
                best = entry;
            }
        }
        best
    }

    /// Cumulative-range sampling: walk the entries accumulating weight and
    /// return the first whose range contains `draw`.  Zero-weight entries
    /// contribute a zero-width range and can never be hit.
    fn pick_weighted(entries: &[Entry], draw: f32) -> &Entry {
        let mut cumulative = 0.0;
        for entry in entries {
            let w = entry.weight();
            cumulative += w;
            if w > 0.0 && draw < cumulative {
                return entry;
            }
        }
        // draw == total can only happen through float rounding; fall back to
        // the last entry that carries any weight.
        entries
            .iter()
            .rev()
            .find(|e| e.weight() > 0.0)
            .expect("select() guarantees a positive total weight")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
