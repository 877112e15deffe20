//! Time source for polling.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source used by the condition waiter.
///
/// The waiter never calls `std::thread::sleep` or `Instant::now` directly so
/// that tests of the engine can run on a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time; `sleep` blocks the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use transit::engine::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.sleep(Duration::from_millis(50));
/// assert_eq!(clock.now() - start, Duration::from_millis(50));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move time forward without sleeping.
    ///
    /// Time stops at the last instant the platform can represent.
    pub fn advance(&self, duration: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(next) = offset
            .checked_add(duration)
            .filter(|next| self.origin.checked_add(*next).is_some())
        {
            *offset = next;
        }
    }

    /// Total time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin.checked_add(self.elapsed()).unwrap_or(self.origin)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn manual_clock_sleep_advances() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_millis(20));
        clock.advance(Duration::from_millis(5));

        assert_eq!(clock.now() - start, Duration::from_millis(25));
    }

    #[test]
    fn manual_clock_ignores_unrepresentable_advance() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(5));

        clock.advance(Duration::MAX);

        assert_eq!(clock.elapsed(), Duration::from_millis(5));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let start = clock.now();
        clock.sleep(Duration::from_millis(1));
        assert!(clock.now() > start);
    }
}
