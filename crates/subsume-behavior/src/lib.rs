//! `subsume-behavior` – Reactive Behaviors & Arbitration
//!
//! Each [`Behavior`][behavior::Behavior] is a self-contained reactive policy
//! that proposes a motor [`Action`][subsume_types::Action] with a confidence
//! value every control cycle; the [`Arbitrator`][arbitrator::Arbitrator]
//! picks exactly one winner per cycle under a single explicit policy.
//!
//! # Modules
//!
//! - [`behavior`] – the polymorphic [`Behavior`][behavior::Behavior]
//!   contract and its per-cycle [`Proposal`][behavior::Proposal].
//! - [`builtin`] – the four built-in behaviors:
//!   [`ObstacleAvoidance`][builtin::ObstacleAvoidance],
//!   [`LineGuard`][builtin::LineGuard],
//!   [`TargetSeek`][builtin::TargetSeek], and
//!   [`DefaultWander`][builtin::DefaultWander] (whose constant positive
//!   baseline guarantees the arbitration table is never all-zero).
//! - [`arbitrator`] – weight computation (`priority × match_degree`) and
//!   single-winner selection under
//!   [`ArbitrationPolicy::MaxWeight`][arbitrator::ArbitrationPolicy] or
//!   [`ArbitrationPolicy::WeightedRandom`][arbitrator::ArbitrationPolicy].

pub mod arbitrator;
pub mod behavior;
pub mod builtin;

pub use arbitrator::{ArbitrationPolicy, ArbitrationResult, Arbitrator, Entry};
pub use behavior::{Behavior, Proposal};
pub use builtin::{DefaultWander, LineGuard, ObstacleAvoidance, TargetSeek};
