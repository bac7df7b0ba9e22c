//! Detection loop latency classification.

use super::IntervalTimer;

/// Lower bound of a plausible loop iteration, in microseconds.
const UNDER_THRESHOLD_US: u64 = 3;

/// Upper bound of a plausible loop iteration, in microseconds.
const ABOVE_THRESHOLD_US: u64 = 2_500;

/// Classifies per-iteration loop durations.
///
/// Durations inside the plausible range `[3, 2500]` µs update the
/// running min/max; durations outside it are counted as anomalies
/// (under or above) without touching min/max. The most recent duration
/// is always retained regardless of classification.
#[derive(Debug, Clone)]
pub struct LoopLatencyTracker {
    timer: IntervalTimer,
    min: u64,
    max: u64,
    last: u64,
    under: u64,
    above: u64,
}

impl LoopLatencyTracker {
    /// Creates a tracker with no observations.
    pub fn new() -> Self {
        Self {
            timer: IntervalTimer::default(),
            min: u64::MAX,
            max: 0,
            last: 0,
            under: 0,
            above: 0,
        }
    }

    /// Marks the start of one loop iteration.
    pub fn begin(&mut self, now_us: u64) {
        self.timer.set_start(now_us);
    }

    /// Marks the end of one loop iteration and classifies its duration.
    pub fn end(&mut self, now_us: u64) {
        self.timer.set_stop(now_us);
        self.record(self.timer.execution_time());
    }

    /// Classifies a single iteration duration in microseconds.
    pub fn record(&mut self, duration_us: u64) {
        self.last = duration_us;
        if (UNDER_THRESHOLD_US..=ABOVE_THRESHOLD_US).contains(&duration_us) {
            if duration_us > self.max {
                self.max = duration_us;
            }
            if duration_us < self.min {
                self.min = duration_us;
            }
        } else if duration_us < UNDER_THRESHOLD_US {
            self.under += 1;
        } else {
            self.above += 1;
        }
    }

    /// Minimum plausible duration observed, or 0 before any plausible
    /// sample has landed.
    pub fn min(&self) -> u64 {
        if self.min == u64::MAX {
            0
        } else {
            self.min
        }
    }

    /// Maximum plausible duration observed.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Most recent duration, plausible or not.
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Count of durations below the plausible range.
    pub fn under_count(&self) -> u64 {
        self.under
    }

    /// Count of durations above the plausible range.
    pub fn above_count(&self) -> u64 {
        self.above
    }
}

impl Default for LoopLatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}
