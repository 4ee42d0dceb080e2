//! `subsume-runtime` – The Control Cycle Engine
//!
//! The execution engine that drives the sense → evaluate → arbitrate → act
//! cycle, once per configured period, until cancelled.
//!
//! # Modules
//!
//! - [`hub`] – [`SensorHub`][hub::SensorHub]: polls every registered
//!   [`SensorSource`][subsume_hal::SensorSource] once per cycle with a
//!   bounded timeout, normalizes the raw samples, and builds the single
//!   immutable [`SensorSnapshot`][subsume_types::SensorSnapshot] all
//!   behaviors share.  A failing sensor degrades to "unavailable"; it never
//!   aborts the cycle.
//! - [`vision`] – [`ColorRange`][vision::ColorRange] and
//!   [`red_ratio`][vision::red_ratio]: fixed-range pixel classification of
//!   camera frames into a single red-pixel ratio.
//! - [`clock`] – [`Clock`][clock::Clock]: the injectable monotonic clock
//!   behind cycle pacing, with a [`FakeClock`][clock::FakeClock] for
//!   deterministic tests.
//! - [`controller`] – [`Controller`][controller::Controller]: the
//!   composition root's cycle driver.  Exclusively owns the
//!   [`ActuatorSink`][subsume_hal::ActuatorSink]; checks the
//!   [`CancelFlag`][controller::CancelFlag] at cycle boundaries and issues
//!   one final `Stop` on the way out.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: one-shot
//!   `tracing` subscriber setup (env-filter, optional JSON via
//!   `SUBSUME_LOG_FORMAT=json`).

pub mod clock;
pub mod controller;
pub mod hub;
pub mod telemetry;
pub mod vision;

pub use clock::{Clock, FakeClock, MonotonicClock};
pub use controller::{CancelFlag, Controller, ControllerConfig};
pub use hub::SensorHub;
pub use telemetry::init_tracing;
pub use vision::{red_ratio, ColorRange};
