//! Pulse rate tracking over rolling one-minute windows (CPM).

use super::IntervalTimer;

/// Accumulates detected pulses into one-minute windows.
///
/// Each pulse increments the current window's counter; once the window
/// has run for a full minute the counter folds into a running sum and
/// the completed-minute count, and a fresh window starts. The average
/// is undefined until the first window completes.
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    window: IntervalTimer,
    current: u32,
    last: u32,
    sum: u64,
    minutes: u32,
}

impl RateTracker {
    /// Creates an idle tracker. Call [`start`](Self::start) before the
    /// first pulse to anchor the window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors the first minute window at `now_us`.
    pub fn start(&mut self, now_us: u64) {
        self.window.set_start(now_us);
    }

    /// Records one detected pulse at `now_us`.
    ///
    /// Folds the window if a minute has elapsed since its start.
    pub fn on_pulse(&mut self, now_us: u64) {
        self.current += 1;
        if self.window.minute_expired(now_us) {
            self.sum += u64::from(self.current);
            self.last = self.current;
            self.current = 0;
            self.minutes += 1;
            self.window.set_start(now_us);
        }
    }

    /// Pulse count of the most recently completed minute.
    pub fn last_minute(&self) -> u32 {
        self.last
    }

    /// Running average over all completed minutes, or `None` before the
    /// first minute completes.
    pub fn average(&self) -> Option<u64> {
        if self.minutes == 0 {
            return None;
        }
        Some(self.sum / u64::from(self.minutes))
    }

    /// Number of completed minute windows.
    pub fn completed_minutes(&self) -> u32 {
        self.minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MINUTE_US;

    /// Feeds `count` pulses inside the current window, then one more
    /// pulse past the minute boundary to fold it.
    fn complete_minute(tracker: &mut RateTracker, window_start: u64, count: u32) {
        for i in 0..count.saturating_sub(1) {
            tracker.on_pulse(window_start + u64::from(i));
        }
        tracker.on_pulse(window_start + MINUTE_US);
    }

    #[test]
    fn test_average_undefined_before_first_minute() {
        let mut tracker = RateTracker::new();
        tracker.start(0);
        tracker.on_pulse(10);
        tracker.on_pulse(20);
        assert_eq!(tracker.average(), None);
        assert_eq!(tracker.last_minute(), 0);
    }

    #[test]
    fn test_single_minute_fold() {
        let mut tracker = RateTracker::new();
        tracker.start(0);
        complete_minute(&mut tracker, 0, 7);
        assert_eq!(tracker.last_minute(), 7);
        assert_eq!(tracker.average(), Some(7));
        assert_eq!(tracker.completed_minutes(), 1);
    }

    #[test]
    fn test_average_floors_over_completed_minutes() {
        let mut tracker = RateTracker::new();
        tracker.start(0);
        let counts = [3u32, 8, 4];
        let mut window_start = 0;
        for &count in &counts {
            complete_minute(&mut tracker, window_start, count);
            window_start += MINUTE_US;
        }
        // floor((3 + 8 + 4) / 3) = 5
        assert_eq!(tracker.average(), Some(5));
        assert_eq!(tracker.last_minute(), 4);
        assert_eq!(tracker.completed_minutes(), 3);
    }

    #[test]
    fn test_window_resets_after_fold() {
        let mut tracker = RateTracker::new();
        tracker.start(0);
        complete_minute(&mut tracker, 0, 5);
        // Pulses in the new window do not disturb the folded count.
        tracker.on_pulse(MINUTE_US + 10);
        tracker.on_pulse(MINUTE_US + 20);
        assert_eq!(tracker.last_minute(), 5);
        assert_eq!(tracker.average(), Some(5));
    }
}
