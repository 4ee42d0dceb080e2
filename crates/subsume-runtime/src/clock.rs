//! Injectable monotonic clock for cycle pacing.
//!
//! The controller never calls `std::thread::sleep` or `Instant::now`
//! directly; it goes through [`Clock`] so tests can drive pacing with a
//! [`FakeClock`] and assert on the exact sleeps requested.

use std::time::{Duration, Instant};

/// A monotonic clock: elapsed time since an arbitrary fixed epoch, plus the
/// ability to sleep.
pub trait Clock: Send {
    /// Monotonic time since the clock's epoch.  Never decreases.
    fn now(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// The real clock, backed by [`Instant`] and [`std::thread::sleep`].
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A deterministic clock for tests.
///
/// `now` advances only through [`FakeClock::advance`] (simulated work) and
/// [`Clock::sleep`] (which also records the requested duration so tests can
/// assert on pacing).
#[derive(Debug, Default)]
pub struct FakeClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `duration` of work elapsing without a sleep.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    /// Every duration passed to [`Clock::sleep`] so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}
