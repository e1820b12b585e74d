//! Idle timeout scheduling.
//!
//! The navigator does not track time. A host keeps an [`IdleTimer`] beside it,
//! re-arms it after each input, and calls [`Navigator::timeout`] when
//! [`IdleTimer::poll`] reports that the interval has passed in silence.
//!
//! Time is passed in as a [`Duration`] since any fixed origin, so the timer
//! works the same with a monotonic clock or a simulated one.
//!
//! [`Navigator::timeout`]: crate::Navigator::timeout

use core::time::Duration;

/// A cancellable, re-armable deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleTimer {
    interval: Duration,
    deadline: Option<Duration>,
}

impl IdleTimer {
    /// Create a disarmed timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Restart the interval from `now`.
    pub fn arm(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.interval));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Check whether the timeout should fire at `now`.
    ///
    /// Returns `true` at most once per elapsed interval. An interval that
    /// elapses while audio is playing is skipped. Either way the timer is
    /// re-armed from `now`.
    pub fn poll(&mut self, now: Duration, audio_busy: bool) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.arm(now);
                !audio_busy
            }
            _ => false,
        }
    }
}
