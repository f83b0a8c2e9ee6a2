//! Injected time source and frame timers
//!
//! Everything frame-driven in this workspace reads time through [`Clock`]
//! and is advanced by an explicit `tick`, so tests can replace real frame
//! timing with a [`ManualClock`].

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> f64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Mutex::new(start_ms),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now_ms: f64) {
        *self.now.lock() = now_ms;
    }

    /// Move forward by `delta_ms` and return the new time
    pub fn advance(&self, delta_ms: f64) -> f64 {
        let mut now = self.now.lock();
        *now += delta_ms;
        *now
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now.lock()
    }
}

/// A single replaceable deadline
///
/// Scheduling while armed replaces the previous deadline; timers never stack.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameTimer {
    deadline: Option<f64>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64) {
        self.deadline = Some(now_ms + delay_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// Disarm and return `true` if the deadline has passed
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000.0);
        assert_eq!(clock.now_ms(), 1_000.0);
        assert_eq!(clock.advance(16.0), 1_016.0);
        clock.set(5.0);
        assert_eq!(clock.now_ms(), 5.0);
    }

    #[test]
    fn test_timer_replaces_deadline() {
        let mut timer = FrameTimer::new();
        timer.schedule(0.0, 50.0);
        timer.schedule(30.0, 50.0);
        assert_eq!(timer.deadline(), Some(80.0));
        assert!(!timer.fire_if_due(60.0));
        assert!(timer.fire_if_due(80.0));
        assert!(!timer.is_armed());
        assert!(!timer.fire_if_due(200.0));
    }

    #[test]
    fn test_system_clock_is_epoch_based() {
        // 2020-01-01 in ms; anything sane is after this
        assert!(SystemClock.now_ms() > 1_577_836_800_000.0);
    }
}
