//! Clock abstraction for testable timing.
//!
//! The dedup cache and the scheduler both reason about wall-clock age,
//! so production code takes a [`Clock`] rather than calling
//! `SystemTime::now` directly. Tests inject [`TestClock`] to advance
//! time deterministically.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Clock abstraction for time operations.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current system time for timestamps.
    fn now_system(&self) -> SystemTime;

    /// Sleeps for the specified duration.
    ///
    /// Production maps to `tokio::time::sleep`; a test clock advances
    /// virtual time immediately instead.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Current system time as milliseconds since the epoch.
    ///
    /// Event sources report `occurred_at` in this unit, so age checks
    /// compare against it directly.
    fn now_millis(&self) -> i64 {
        let since_epoch = self.now_system().duration_since(UNIX_EPOCH).unwrap_or_default();
        i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Real clock implementation using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test clock for deterministic time control.
///
/// System time starts at the wall clock (or a chosen start time) and
/// advances only through [`advance`](Self::advance) or `sleep`.
#[derive(Debug, Clone)]
pub struct TestClock {
    /// System time as nanoseconds since UNIX_EPOCH
    system_ns: Arc<AtomicU64>,
}

impl TestClock {
    /// Creates a new test clock starting at the current time.
    pub fn new() -> Self {
        Self::with_start_time(SystemTime::now())
    }

    /// Creates a test clock starting at a specific system time.
    pub fn with_start_time(start: SystemTime) -> Self {
        let since_epoch = start.duration_since(UNIX_EPOCH).unwrap_or_default();

        Self {
            system_ns: Arc::new(AtomicU64::new(
                u64::try_from(since_epoch.as_nanos().min(u128::from(u64::MAX))).unwrap_or(0),
            )),
        }
    }

    /// Advances the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let duration_ns = u64::try_from(duration.as_nanos().min(u128::from(u64::MAX))).unwrap_or(0);
        self.system_ns.fetch_add(duration_ns, Ordering::AcqRel);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_system(&self) -> SystemTime {
        let ns = self.system_ns.load(Ordering::Acquire);
        UNIX_EPOCH + Duration::from_nanos(ns)
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        // In tests, sleep just advances the clock
        self.advance(duration);
        Box::pin(tokio::task::yield_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_millis_track_system_time() {
        let start = UNIX_EPOCH + Duration::from_millis(5_000);
        let clock = TestClock::with_start_time(start);

        assert_eq!(clock.now_millis(), 5_000);

        clock.advance(Duration::from_millis(1_500));
        assert_eq!(clock.now_millis(), 6_500);
    }

    #[test]
    fn clones_share_the_same_timeline() {
        let clock = TestClock::with_start_time(UNIX_EPOCH);
        let observer = clock.clone();

        clock.advance(Duration::from_secs(10));

        assert_eq!(observer.now_millis(), 10_000);
    }

    #[tokio::test]
    async fn test_clock_sleep_advances_virtual_time() {
        let clock = TestClock::with_start_time(UNIX_EPOCH);

        clock.sleep(Duration::from_secs(5)).await;

        assert_eq!(clock.now_millis(), 5_000);
    }

    #[test]
    fn real_clock_millis_is_positive() {
        assert!(RealClock::new().now_millis() > 0);
    }
}
