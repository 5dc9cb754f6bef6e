//! Periodic backend reachability probing.
//!
//! A probe is one GET against the backend base URL, never retried. The
//! monitor tracks whether an alert is currently raised so the sink sees
//! transitions, not every probe: one alert when the backend goes bad,
//! one recovery when it answers again.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use relay_core::ConfigStore;
use tracing::{debug, warn};

use crate::{
    alert::AlertSink,
    client::ForwardClient,
    url::{normalize_backend_url, strip_submission_suffix},
};

/// Result of one health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The backend answered 200.
    Healthy,
    /// The backend is unreachable or answering with errors.
    Unhealthy {
        /// Operator-facing reason, e.g. `Backend error: 503`.
        reason: String,
    },
    /// No backend is configured; nothing was probed.
    Skipped,
}

/// Probes the backend and raises or clears the backend-error alert.
#[derive(Debug)]
pub struct HealthMonitor {
    client: ForwardClient,
    config: Arc<dyn ConfigStore>,
    sink: Arc<dyn AlertSink>,
    alerted: AtomicBool,
}

impl HealthMonitor {
    /// Creates a monitor over the given client, config source, and sink.
    pub fn new(
        client: ForwardClient,
        config: Arc<dyn ConfigStore>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self { client, config, sink, alerted: AtomicBool::new(false) }
    }

    /// Runs one probe against the backend base URL.
    ///
    /// The base URL is the normalized backend address with the
    /// submission suffix stripped. Only a 200 counts as healthy.
    pub async fn probe(&self) -> ProbeOutcome {
        let snapshot = self.config.snapshot().await;
        if snapshot.backend_url.trim().is_empty() {
            debug!("no backend configured, skipping health probe");
            return ProbeOutcome::Skipped;
        }

        let base = strip_submission_suffix(&normalize_backend_url(&snapshot.backend_url));

        let outcome = match self.client.get(&base).await {
            Ok(response) if response.status == 200 => ProbeOutcome::Healthy,
            Ok(response) => {
                ProbeOutcome::Unhealthy { reason: format!("Backend error: {}", response.status) }
            },
            Err(error) => {
                debug!(%error, "health probe transport failure");
                ProbeOutcome::Unhealthy { reason: "Backend unreachable".to_string() }
            },
        };

        match &outcome {
            ProbeOutcome::Healthy => {
                if self.alerted.swap(false, Ordering::SeqCst) {
                    self.sink.backend_recovered().await;
                }
            },
            ProbeOutcome::Unhealthy { reason } => {
                warn!(%reason, "backend health probe failed");
                if !self.alerted.swap(true, Ordering::SeqCst) {
                    self.sink.backend_error(reason).await;
                }
            },
            ProbeOutcome::Skipped => {},
        }

        outcome
    }
}
