// Time sources and the single-slot debounce timer used by the history store.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of "now" for debounced bookkeeping
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock advanced by hand, for deterministic tests.
///
/// Clones share the same time, so a test can keep a handle while the store
/// owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

/// A single pending deadline that can be rescheduled or cancelled.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)start the window from `now`, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a pending deadline has been reached.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance(Duration::from_millis(250));

        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn test_timer_reschedule_pushes_deadline() {
        let clock = ManualClock::new();
        let mut timer = DebounceTimer::new(Duration::from_millis(300));

        timer.schedule(clock.now());
        clock.advance(Duration::from_millis(200));
        timer.schedule(clock.now());
        clock.advance(Duration::from_millis(200));
        assert!(!timer.is_due(clock.now()));

        clock.advance(Duration::from_millis(100));
        assert!(timer.is_due(clock.now()));

        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.is_due(clock.now()));
    }
}
