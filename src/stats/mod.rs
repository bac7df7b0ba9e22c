//! Timing and rate statistics for the detection loop.
//!
//! These trackers are fed microsecond timestamps by their caller rather
//! than reading a clock themselves, which keeps them deterministic under
//! test. The detection loop drives them from a single monotonic clock.

mod interval;
mod latency;
mod rate;

pub use interval::{IntervalTimer, MonotonicClock, MINUTE_US};
pub use latency::LoopLatencyTracker;
pub use rate::RateTracker;
