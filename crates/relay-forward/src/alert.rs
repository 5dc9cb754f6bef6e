//! Operator-facing alert surface.
//!
//! The health monitor and scheduler report status transitions through an
//! [`AlertSink`] rather than logging directly, so embedders can route
//! alerts to whatever surface fits their deployment. The default sink
//! emits structured log events.

use async_trait::async_trait;
use tracing::{error, info};

/// Receives operator-facing status notifications.
#[async_trait]
pub trait AlertSink: Send + Sync + std::fmt::Debug {
    /// The backend is unreachable or answering with errors.
    async fn backend_error(&self, message: &str);

    /// The backend recovered after a previously reported error.
    async fn backend_recovered(&self);

    /// A routine status message, such as service start or stop.
    async fn service_status(&self, message: &str);
}

/// Alert sink that emits structured log events.
#[derive(Debug, Clone, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn backend_error(&self, message: &str) {
        error!(alert = true, "{message}");
    }

    async fn backend_recovered(&self) {
        info!(alert = true, "backend recovered");
    }

    async fn service_status(&self, message: &str) {
        info!(alert = true, "{message}");
    }
}

/// Alert sink that discards everything, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct NoOpAlertSink;

#[async_trait]
impl AlertSink for NoOpAlertSink {
    async fn backend_error(&self, _message: &str) {}

    async fn backend_recovered(&self) {}

    async fn service_status(&self, _message: &str) {}
}
