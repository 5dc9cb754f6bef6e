//! Batched event submission to the configured backend.
//!
//! Each send reads a fresh configuration snapshot, so turning the relay
//! off or changing the backend takes effect on the very next cycle. A
//! snapshot that is incomplete short-circuits to `Skipped` with zero
//! network activity; that is the normal state of an unconfigured
//! deployment, not an error.

use std::sync::Arc;

use relay_core::{ConfigStore, Event, RelayError, Result};
use tracing::{debug, info, warn};

use crate::{
    client::ForwardClient,
    payload::{build_body, PayloadMode},
    url::normalize_backend_url,
};

/// Statuses the backend uses to acknowledge a batch. 207 means partial
/// per-recipient delivery, which still acknowledges receipt of the batch.
const ACCEPTED_STATUSES: [u16; 2] = [200, 207];

/// Result of one send attempt that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend acknowledged the batch.
    Delivered {
        /// Status the backend answered with (200 or 207).
        status: u16,
    },
    /// Forwarding is disabled or unconfigured; nothing was sent.
    Skipped,
}

/// Sends event batches to the backend.
#[derive(Debug)]
pub struct Forwarder {
    client: ForwardClient,
    config: Arc<dyn ConfigStore>,
    mode: PayloadMode,
}

impl Forwarder {
    /// Creates a forwarder with the given client, config source, and
    /// payload mode.
    pub fn new(client: ForwardClient, config: Arc<dyn ConfigStore>, mode: PayloadMode) -> Self {
        Self { client, config, mode }
    }

    /// Sends a batch of events as a single request.
    ///
    /// An empty batch is `Skipped` without touching configuration or the
    /// network. Accepted statuses are 200 and 207; any other status is
    /// `RelayError::BackendRejected` and transport failures surface as
    /// `RelayError::Transport`. No inline retry: the caller's next cycle
    /// is the retry.
    pub async fn send(&self, events: &[Event]) -> Result<SendOutcome> {
        if events.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let snapshot = self.config.snapshot().await;
        if !snapshot.is_complete() {
            debug!("forwarding disabled or unconfigured, skipping batch");
            return Ok(SendOutcome::Skipped);
        }

        let url = normalize_backend_url(&snapshot.backend_url);
        let body = build_body(self.mode, events, &snapshot)?;

        let response =
            self.client.post(&url, &snapshot.secret, body.content_type, body.body).await?;

        if ACCEPTED_STATUSES.contains(&response.status) {
            info!(count = events.len(), status = response.status, "batch delivered");
            Ok(SendOutcome::Delivered { status: response.status })
        } else {
            warn!(status = response.status, "backend rejected batch");
            Err(RelayError::backend_rejected(response.status, response.body))
        }
    }

    /// Sends a single synthetic message through the normal forwarding
    /// path, for verifying a deployment end to end.
    pub async fn send_test(&self, device_label: &str, now_millis: i64) -> Result<SendOutcome> {
        let event = Event::message(
            "test",
            now_millis,
            device_label,
            format!("Test notification from {device_label} at {now_millis}"),
        );
        self.send(std::slice::from_ref(&event)).await
    }
}
