//! Generic `SensorSource` trait for pollable sensing hardware.
//!
//! Drivers implement this trait and are registered with the sensor hub in
//! `subsume-runtime`.  The rest of the system only ever talks to the trait,
//! so device drivers can be swapped without touching behavior or arbitration
//! logic.

use std::time::Duration;

use subsume_types::{ControlError, SensorKind};

/// A raw image frame returned by a camera driver.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Packed RGB24 pixel data, row-major, 3 bytes per pixel.
    pub data: Vec<u8>,
}

impl CameraFrame {
    /// Total pixel count (`width * height`).
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// An un-normalized sample as produced by a device driver.
///
/// Normalization into [`Reading`][subsume_types::Reading] units is the
/// sensor hub's job; drivers report whatever the hardware gives them.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSample {
    /// Ultrasonic echo distance, already in centimeters.
    DistanceCm(f32),
    /// Raw IR reflectance counts, left to right across the array.
    /// Low counts = reflective (white), high counts = absorbing (dark).
    ReflectanceCounts(Vec<u16>),
    /// One camera frame.
    Frame(CameraFrame),
}

/// A pollable sensing device.
///
/// # Contract
///
/// [`poll`][SensorSource::poll] must return within `timeout`; a driver that
/// cannot produce a sample in time returns
/// [`ControlError::SensorTimeout`].  The hub treats any error as "sensor
/// unavailable this cycle"; a failing sensor never aborts the control
/// cycle.
pub trait SensorSource: Send {
    /// Which snapshot channel this device feeds.
    fn kind(&self) -> SensorKind;

    /// Attempt a bounded-time read of the device.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::SensorTimeout`] when the device does not
    /// answer within `timeout`, or [`ControlError::SensorFault`] for any
    /// other device-level failure.
    fn poll(&mut self, timeout: Duration) -> Result<RawSample, ControlError>;
}
