//! Interval measurement against a monotonic microsecond clock.

use std::time::Instant;

/// One minute, in microseconds. The rate window length.
pub const MINUTE_US: u64 = 60_000_000;

/// Monotonic microsecond clock, anchored at construction.
///
/// Wraps [`std::time::Instant`] so every timestamp handed to the
/// trackers comes from a single monotonic origin.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Microseconds elapsed since the clock was created.
    pub fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Start/stop duration measurement over caller-supplied timestamps.
///
/// Also answers the minute-boundary test used by the rate window.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTimer {
    start: u64,
    stop: u64,
}

impl IntervalTimer {
    /// Marks the start of a measured interval.
    pub fn set_start(&mut self, now_us: u64) {
        self.start = now_us;
    }

    /// Marks the end of a measured interval.
    pub fn set_stop(&mut self, now_us: u64) {
        self.stop = now_us;
    }

    /// Duration between the last start and stop marks, in microseconds.
    pub fn execution_time(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    /// True once a full minute has elapsed since the start mark.
    pub fn minute_expired(&self, now_us: u64) -> bool {
        now_us.saturating_sub(self.start) >= MINUTE_US
    }
}
