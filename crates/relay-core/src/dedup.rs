//! Bounded, time-windowed deduplication cache.
//!
//! Decides whether an observed event has already been reported. Entries
//! map dedup keys to their insertion time and are evicted by age and by
//! count. The cache is in-memory only and resets on restart; that is a
//! stated non-goal boundary, not a defect.
//!
//! One instance exists per event kind. Instances are single-writer: the
//! poll loop and the reactive call path share the call-kind instance
//! behind external serialization (a mutex in the scheduler), never
//! through concurrent unsynchronized mutation.

use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::time::Clock;

/// Default maximum age of a cache entry, and of an event, before it is
/// considered stale.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Default maximum number of entries retained after eviction.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Membership test plus insertion for "already notified" decisions.
#[derive(Debug)]
pub struct DedupCache {
    entries: HashMap<String, i64>,
    retention: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl DedupCache {
    /// Creates a cache with the default retention window and entry limit.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(DEFAULT_RETENTION, DEFAULT_MAX_ENTRIES, clock)
    }

    /// Creates a cache with explicit limits.
    pub fn with_limits(retention: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self { entries: HashMap::new(), retention, max_entries, clock }
    }

    /// Decides whether the event behind `key` should be forwarded, and
    /// records it if so.
    ///
    /// Returns false for an empty key, a key already present (already
    /// notified), or an event older than the retention window (stale,
    /// e.g. a backlog replay after a service restart). Otherwise inserts
    /// `key -> now` and returns true.
    pub fn should_notify(&mut self, key: &str, event_ts_millis: i64) -> bool {
        let now = self.clock.now_millis();

        if key.is_empty() {
            return false;
        }
        if self.entries.contains_key(key) {
            return false;
        }
        if now.saturating_sub(event_ts_millis) > self.retention_millis() {
            return false;
        }

        self.entries.insert(key.to_owned(), now);
        true
    }

    /// Removes the given keys.
    ///
    /// Used by the scheduler when a batched send did not reach the
    /// backend, so a transient outage never permanently suppresses the
    /// affected events.
    pub fn forget<'a>(&mut self, keys: impl IntoIterator<Item = &'a String>) {
        for key in keys {
            self.entries.remove(key);
        }
    }

    /// Evicts stale and surplus entries.
    ///
    /// Age-based eviction runs first: entries older than the retention
    /// window are removed. Count-based trimming then drops the
    /// oldest-inserted entries until at most `max_entries` remain.
    /// Called once per poll cycle after the batch, not per event.
    pub fn evict(&mut self) {
        let now = self.clock.now_millis();
        let retention = self.retention_millis();
        self.entries.retain(|_, inserted_at| now.saturating_sub(*inserted_at) <= retention);

        if self.entries.len() > self.max_entries {
            let mut by_age: Vec<(String, i64)> =
                self.entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
            by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

            let surplus = self.entries.len() - self.max_entries;
            for (key, _) in by_age.into_iter().take(surplus) {
                self.entries.remove(&key);
            }
        }
    }

    /// Whether `key` is currently recorded as notified.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn retention_millis(&self) -> i64 {
        i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX)
    }
}
