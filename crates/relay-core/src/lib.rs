//! Core domain types for the otp-relay service.
//!
//! Provides the event model, the deduplication cache that decides whether
//! an observed event has already been reported, the keying scheme that
//! makes that decision deterministic, and the configuration surface read
//! by the forwarding path. The other crates depend on these foundations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dedup;
pub mod error;
pub mod keyer;
pub mod models;
pub mod time;

pub use config::{ConfigSnapshot, ConfigStore, FigmentConfigStore, MemoryConfigStore, ENV_PREFIX};
pub use dedup::DedupCache;
pub use error::{RelayError, Result};
pub use keyer::{dedup_key, event_key};
pub use models::{Event, EventKind};
pub use time::{Clock, RealClock, TestClock};
