//! Error types for the relay pipeline.
//!
//! Nothing here is fatal to the process: all failures are absorbed at the
//! component boundary and logged. Variants carry enough context for retry
//! decisions and for the health alerting surface.

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Failure taxonomy for the event-forwarding pipeline.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// Transport-level failure: DNS, connection refused, timeout, TLS.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// Backend answered with a status outside the success set.
    #[error("backend rejected request: HTTP {status}")]
    BackendRejected {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Decryption or authentication-tag verification failed.
    #[error("payload authentication failed")]
    CryptoAuth,

    /// A single platform record could not be read. The rest of the batch
    /// continues.
    #[error("unreadable source record: {message}")]
    MalformedSource {
        /// Description of the unreadable record
        message: String,
    },

    /// Invalid or incomplete configuration discovered at use time.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },
}

impl RelayError {
    /// Creates a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Creates a backend-rejection error from an HTTP response.
    pub fn backend_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::BackendRejected { status, body: body.into() }
    }

    /// Creates a malformed-source error.
    pub fn malformed_source(message: impl Into<String>) -> Self {
        Self::MalformedSource { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }
}
