//! `subsume-hal` – Hardware Ports
//!
//! The traits the control core talks to instead of physical devices.
//! Drivers for real hardware (ultrasonic ranger, IR reflectance array,
//! camera, motor shield) implement these and live outside this workspace;
//! the [`sim`] module provides in-process stand-ins so the full stack runs
//! in headless tests and CI pipelines.
//!
//! # Modules
//!
//! - [`sensor`] – [`SensorSource`][sensor::SensorSource]: per-device
//!   bounded-time polling port returning raw, un-normalized samples.
//! - [`actuator`] – [`ActuatorSink`][actuator::ActuatorSink]: the single
//!   outlet for arbitrated [`Action`][subsume_types::Action] commands.
//! - [`sim`] – scripted [`SimSensor`][sim::SimSensor] and recording
//!   [`SimDrive`][sim::SimDrive] drivers plus the [`SimRig`][sim::SimRig]
//!   builder.

pub mod actuator;
pub mod sensor;
pub mod sim;

pub use actuator::ActuatorSink;
pub use sensor::{CameraFrame, RawSample, SensorSource};
pub use sim::{SimDrive, SimRig, SimSensor};
