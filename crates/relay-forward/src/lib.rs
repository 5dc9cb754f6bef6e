//! Reliable forwarding of observed events to a remote backend.
//!
//! Builds and sends authenticated requests, probes backend health on an
//! independent period, and owns the periodic and reactive loops that
//! drive the pipeline. Failure handling follows one rule: nothing here
//! is fatal to the process, and a send that did not reach the backend
//! leaves the originating events eligible for the next cycle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod alert;
pub mod client;
pub mod config;
pub mod forwarder;
pub mod health;
pub mod payload;
pub mod scheduler;
pub mod source;
pub mod url;

pub use alert::{AlertSink, NoOpAlertSink, TracingAlertSink};
pub use client::{ClientConfig, ForwardClient, ForwardResponse};
pub use config::ServiceConfig;
pub use forwarder::{Forwarder, SendOutcome};
pub use health::{HealthMonitor, ProbeOutcome};
pub use payload::{build_body, PayloadMode, RequestBody};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
pub use source::{ChannelEventSource, EventSource, RingSignal, SourceRecord};
pub use url::{normalize_backend_url, strip_submission_suffix, SUBMISSION_SUFFIX};
