//! Event source abstraction.
//!
//! The scheduler reads observed events through [`EventSource`] and never
//! touches platform APIs directly. Sources may return events in any
//! order and may hand back the same event on consecutive polls; the
//! dedup cache absorbs reobservation. A record the source could not
//! decode is reported in place so the rest of the batch still flows.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use relay_core::{dedup::DEFAULT_RETENTION, Clock, Event, EventKind, RelayError, Result};
use tokio::sync::Mutex;

/// One record from a poll: a decoded event, or the reason a single
/// record could not be decoded.
pub type SourceRecord = std::result::Result<Event, RelayError>;

/// Marker sent on the reactive channel when an incoming call starts
/// ringing. Carries no payload; the scheduler re-reads the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSignal;

/// Where observed events come from.
#[async_trait]
pub trait EventSource: Send + Sync + std::fmt::Debug {
    /// Returns recent events of the given kind, most recent last or in
    /// any other order. Individual unreadable records appear as `Err`
    /// entries rather than failing the whole poll.
    async fn poll(&self, kind: EventKind) -> Result<Vec<SourceRecord>>;

    /// Returns the most recent incoming call, if any. Used by the
    /// reactive ring path, which wants exactly one candidate.
    async fn latest_call(&self) -> Result<Option<Event>>;
}

/// In-memory, push-fed event source.
///
/// Platform adapters push decoded events in; the scheduler polls them
/// out. An event stays visible for the retention window, so a send that
/// failed one cycle is naturally re-offered the next, and is pruned
/// once it ages past the window. Unreadable-record markers are handed
/// out exactly once, on the first poll after they arrive.
#[derive(Debug)]
pub struct ChannelEventSource {
    records: Mutex<Vec<SourceRecord>>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl ChannelEventSource {
    /// Creates an empty source with the default retention window.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_retention(clock, DEFAULT_RETENTION)
    }

    /// Creates an empty source with an explicit retention window.
    pub fn with_retention(clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self { records: Mutex::new(Vec::new()), clock, retention }
    }

    /// Pushes an observed event.
    pub async fn push(&self, event: Event) {
        self.records.lock().await.push(Ok(event));
    }

    /// Pushes an unreadable-record marker.
    pub async fn push_malformed(&self, message: impl Into<String>) {
        self.records.lock().await.push(Err(RelayError::malformed_source(message)));
    }

    fn cutoff_millis(&self) -> i64 {
        let retention = i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX);
        self.clock.now_millis().saturating_sub(retention)
    }

    /// Drops events older than the cutoff. Markers are untouched; they
    /// are drained by `poll`.
    fn prune(records: &mut Vec<SourceRecord>, cutoff: i64) {
        records.retain(|record| match record {
            Ok(event) => event.occurred_at >= cutoff,
            Err(_) => true,
        });
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn poll(&self, kind: EventKind) -> Result<Vec<SourceRecord>> {
        let cutoff = self.cutoff_millis();
        let mut records = self.records.lock().await;
        Self::prune(&mut records, cutoff);

        let mut out = Vec::new();
        let mut kept = Vec::with_capacity(records.len());
        for record in records.drain(..) {
            match record {
                Ok(event) => {
                    if event.kind == kind {
                        out.push(Ok(event.clone()));
                    }
                    kept.push(Ok(event));
                },
                // Markers have no kind; whichever poll drains one first
                // reports it, exactly once.
                Err(error) => out.push(Err(error)),
            }
        }
        *records = kept;

        Ok(out)
    }

    async fn latest_call(&self) -> Result<Option<Event>> {
        let cutoff = self.cutoff_millis();
        let mut records = self.records.lock().await;
        Self::prune(&mut records, cutoff);

        Ok(records
            .iter()
            .filter_map(|record| record.as_ref().ok())
            .filter(|event| event.kind == EventKind::Call)
            .max_by_key(|event| event.occurred_at)
            .cloned())
    }
}
