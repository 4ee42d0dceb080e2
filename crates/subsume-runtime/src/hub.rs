//! [`SensorHub`] – once-per-cycle sensor polling and normalization.
//!
//! The hub owns every registered [`SensorSource`], polls each one exactly
//! once per cycle with a bounded timeout, normalizes the raw samples into
//! [`Reading`] units, and assembles the single immutable
//! [`SensorSnapshot`] the whole cycle shares.
//!
//! # Degradation
//!
//! A sensor that times out, faults, or returns a sample of the wrong shape
//! is logged at `warn!` and simply left out of the snapshot; it reads as
//! unavailable for the cycle.  No sensor failure ever reaches the caller of
//! [`SensorHub::update`].  The worst-case cycle stall is therefore bounded
//! by `sources × poll_timeout`.
//!
//! # Normalization
//!
//! Normalization is the hub's job, not the behaviors':
//!
//! - ultrasonic echo → distance in centimeters (pass-through);
//! - IR reflectance counts → ratios in `[0, 1]` by dividing by the
//!   configured full-scale count (0.0 = white/line marking, 1.0 = dark
//!   floor), clamped;
//! - camera frame → red-pixel ratio via [`red_ratio`] against the
//!   configured [`ColorRange`].

use std::collections::HashMap;
use std::time::Duration;

use subsume_hal::{RawSample, SensorSource};
use subsume_types::{Reading, SensorKind, SensorSnapshot};
use tracing::warn;

use crate::vision::{red_ratio, ColorRange};

/// Polls registered sensor sources and builds the per-cycle snapshot.
pub struct SensorHub {
    sources: Vec<Box<dyn SensorSource>>,
    poll_timeout: Duration,
    /// Raw count the IR array reads over fully dark floor.
    reflectance_full_scale: u16,
    red_range: ColorRange,
}

impl SensorHub {
    /// Count the IR array reports over fully dark floor; counts at or above
    /// this normalize to 1.0.
    pub const DEFAULT_REFLECTANCE_FULL_SCALE: u16 = 2000;
    /// Per-sensor poll budget.
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

    /// A hub over `sources` with default timeout, full-scale count, and red
    /// range.
    pub fn new(sources: Vec<Box<dyn SensorSource>>) -> Self {
        Self {
            sources,
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
            reflectance_full_scale: Self::DEFAULT_REFLECTANCE_FULL_SCALE,
            red_range: ColorRange::default(),
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_reflectance_full_scale(mut self, full_scale: u16) -> Self {
        self.reflectance_full_scale = full_scale.max(1);
        self
    }

    pub fn with_red_range(mut self, red_range: ColorRange) -> Self {
        self.red_range = red_range;
        self
    }

    /// Poll every source once and build this cycle's snapshot.
    ///
    /// Infallible by design: sensor-level faults surface only as absent
    /// readings.
    pub fn update(&mut self) -> SensorSnapshot {
        let mut readings: HashMap<SensorKind, Reading> = HashMap::new();

        for source in &mut self.sources {
            let kind = source.kind();
            match source.poll(self.poll_timeout) {
                Ok(sample) => match Self::normalize(
                    kind,
                    sample,
                    self.reflectance_full_scale,
                    &self.red_range,
                ) {
                    Some(reading) => {
                        readings.insert(kind, reading);
                    }
                    None => {
                        warn!(sensor = %kind, "sample shape does not match sensor kind; degrading to unavailable");
                    }
                },
                Err(err) => {
                    warn!(sensor = %kind, error = %err, "sensor poll failed; degrading to unavailable");
                }
            }
        }

        SensorSnapshot::new(readings)
    }

    /// Convert a raw device sample into normalized [`Reading`] units.
    ///
    /// Returns `None` when the sample shape does not belong to `kind`.
    fn normalize(
        kind: SensorKind,
        sample: RawSample,
        full_scale: u16,
        red_range: &ColorRange,
    ) -> Option<Reading> {
        match (kind, sample) {
            (SensorKind::Proximity, RawSample::DistanceCm(cm)) => {
                Some(Reading::Distance { cm })
            }
            (SensorKind::FloorReflectance, RawSample::ReflectanceCounts(counts)) => {
                let scale = full_scale as f32;
                let ratios = counts
                    .iter()
                    .map(|&c| (c as f32 / scale).clamp(0.0, 1.0))
                    .collect();
                Some(Reading::Reflectance(ratios))
            }
            (SensorKind::VisionRedRatio, RawSample::Frame(frame)) => {
                Some(Reading::RedRatio(red_ratio(&frame, red_range)))
            }
            _ => None,
        }
    }
}
