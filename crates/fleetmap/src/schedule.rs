//! One-shot timer handles driven by an explicit clock.
//!
//! The engine never sleeps and never reads the wall clock. Hosts pass the
//! current [`Instant`] into every time-dependent call, which keeps the layout
//! deterministic under test (a virtual clock is just an `Instant` that the
//! test advances by hand).

use std::time::{Duration, Instant};

/// A cancellable one-shot task firing `delay` after it was armed.
///
/// Arming an already armed task is a no-op, so a burst of requests inside one
/// window collapses into a single firing.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use fleetmap::schedule::ScheduledTask;
///
/// let start = Instant::now();
/// let mut render = ScheduledTask::new(Duration::from_millis(32));
///
/// assert!(render.arm(start));
/// assert!(!render.arm(start + Duration::from_millis(10)));
///
/// assert!(!render.poll(start + Duration::from_millis(20)));
/// assert!(render.poll(start + Duration::from_millis(32)));
/// assert!(!render.is_armed());
/// ```
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ScheduledTask {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms the task to fire at `now + delay`.
    ///
    /// Returns `false` when the task was already armed; the existing deadline
    /// is kept.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    /// Disarms the task. Returns whether a firing was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Fires the task if its deadline has passed, disarming it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the task fires, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(32);

    #[test]
    fn test_fires_once_per_window() {
        let start = Instant::now();
        let mut task = ScheduledTask::new(WINDOW);

        assert!(task.arm(start));
        for offset in [1, 5, 31] {
            assert!(!task.arm(start + Duration::from_millis(offset)));
        }
        assert_eq!(task.deadline(), Some(start + WINDOW));

        assert!(task.poll(start + WINDOW));
        assert!(!task.poll(start + WINDOW * 2));
    }

    #[test]
    fn test_rearm_after_firing() {
        let start = Instant::now();
        let mut task = ScheduledTask::new(WINDOW);

        task.arm(start);
        assert!(task.poll(start + WINDOW));

        let later = start + Duration::from_millis(100);
        assert!(task.arm(later));
        assert_eq!(task.deadline(), Some(later + WINDOW));
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let start = Instant::now();
        let mut task = ScheduledTask::new(WINDOW);

        task.arm(start);
        assert!(task.cancel());
        assert!(!task.cancel());
        assert!(!task.poll(start + WINDOW * 10));
    }

    #[test]
    fn test_poll_before_deadline() {
        let start = Instant::now();
        let mut task = ScheduledTask::new(WINDOW);

        assert!(!task.poll(start));
        task.arm(start);
        assert!(!task.poll(start + Duration::from_millis(31)));
        assert!(task.is_armed());
    }
}
