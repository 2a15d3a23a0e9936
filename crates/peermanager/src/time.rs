//! Injected time. The peer manager never reads the system clock
//! directly; every timestamp flows through [`TimeSource`] so tests can
//! pin and advance time deterministically. Timestamps are plain `u64`
//! seconds and the source is expected to be monotone — the conflict
//! cooldown arithmetic relies on time never moving backwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A monotone point-in-time query, in whole seconds.
pub trait TimeSource: Send + Sync {
    /// The current time.
    fn now(&self) -> u64;
}

/// Production source backed by the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Test source: a settable, advanceable clock.
#[derive(Debug, Default)]
pub struct MockTime {
    seconds: AtomicU64,
}

impl MockTime {
    /// Creates a mock clock starting at `seconds`.
    #[must_use]
    pub fn new(seconds: u64) -> Self {
        MockTime {
            seconds: AtomicU64::new(seconds),
        }
    }

    /// Moves the clock forward by `delta` seconds.
    pub fn advance(&self, delta: u64) {
        self.seconds.fetch_add(delta, Ordering::SeqCst);
    }

    /// Pins the clock to `seconds`.
    pub fn set(&self, seconds: u64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }
}

impl TimeSource for MockTime {
    fn now(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_time_starts_where_told() {
        let clock = MockTime::new(1_000);
        assert_eq!(clock.now(), 1_000);
    }

    #[test]
    fn test_mock_time_advances() {
        let clock = MockTime::new(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        clock.advance(0);
        assert_eq!(clock.now(), 15);
    }

    #[test]
    fn test_mock_time_set() {
        let clock = MockTime::new(10);
        clock.set(99);
        assert_eq!(clock.now(), 99);
    }

    #[test]
    fn test_system_time_nonzero() {
        // Sanity only: any real clock is far past the epoch.
        assert!(SystemTimeSource.now() > 1_500_000_000);
    }
}
