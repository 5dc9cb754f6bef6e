//! Dedup key derivation.
//!
//! A dedup key deterministically identifies "this event, today" for
//! suppression purposes. The reporting day is part of the hash input so
//! that otherwise-identical content on a later day produces a different
//! key; recurring legitimate events (repeated OTP codes from the same
//! sender) are not suppressed forever. Hash collisions are treated as
//! duplicates, which is acceptable at SHA-256 width.

use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

use crate::models::{Event, EventKind};
use crate::time::Clock;

/// Derives the dedup key for `(kind, content)` on the given day.
///
/// The key is the lowercase hex SHA-256 of `"{kind}|{content}|{yyyymmdd}"`.
pub fn dedup_key(kind: EventKind, content: &str, day: NaiveDate) -> String {
    let input = format!("{kind}|{content}|{}", day.format("%Y%m%d"));

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derives the dedup key for an event as observed right now.
///
/// The event's source-local id is the content: two observations of the
/// same `(kind, id)` on the same day collapse to one key regardless of
/// which path (poll loop or reactive trigger) saw them first.
pub fn event_key(event: &Event, clock: &dyn Clock) -> String {
    dedup_key(event.kind, &event.id, day_bucket(clock.now_system()))
}

/// UTC calendar day a timestamp falls into.
pub fn day_bucket(at: SystemTime) -> NaiveDate {
    DateTime::<Utc>::from(at).date_naive()
}
