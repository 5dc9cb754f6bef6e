//! Service-level configuration.
//!
//! Distinct from [`relay_core::ConfigSnapshot`]: the snapshot holds the
//! user-controlled integration settings that may change at any time,
//! while [`ServiceConfig`] holds deployment-time settings (intervals,
//! payload mode, timeouts) loaded once at startup and validated before
//! the loops start.

use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use relay_core::{RelayError, Result, ENV_PREFIX};
use serde::{Deserialize, Serialize};

use crate::{client::ClientConfig, payload::PayloadMode, scheduler::SchedulerConfig};

/// Deployment-time settings, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to the integration-settings TOML file, re-read per send.
    pub settings_path: String,
    /// Poll loop period, seconds.
    pub poll_interval_secs: u64,
    /// Health loop period, seconds.
    pub health_interval_secs: u64,
    /// Ring settle delay, milliseconds.
    pub ring_delay_ms: u64,
    /// HTTP request timeout, seconds.
    pub request_timeout_secs: u64,
    /// Wire format: `json`, `plaintext`, or `encrypted`.
    pub payload_mode: String,
    /// Label identifying this device in test notifications.
    pub device_label: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            settings_path: "otp-relay.toml".to_string(),
            poll_interval_secs: 60,
            health_interval_secs: 600,
            ring_delay_ms: 2_000,
            request_timeout_secs: 30,
            payload_mode: "json".to_string(),
            device_label: "otp-relay".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from the given TOML file and environment
    /// overrides, on top of defaults.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Configuration` when the sources cannot be
    /// read or fail validation.
    pub fn load(path: &str) -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| RelayError::configuration(format!("failed to load configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that the settings can actually drive the loops.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(RelayError::configuration("poll_interval_secs must be positive"));
        }
        if self.health_interval_secs == 0 {
            return Err(RelayError::configuration("health_interval_secs must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(RelayError::configuration("request_timeout_secs must be positive"));
        }
        self.payload_mode()?;
        Ok(())
    }

    /// The configured wire format.
    pub fn payload_mode(&self) -> Result<PayloadMode> {
        self.payload_mode.parse()
    }

    /// Timing knobs for the scheduler.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            health_interval: Duration::from_secs(self.health_interval_secs),
            ring_delay: Duration::from_millis(self.ring_delay_ms),
        }
    }

    /// Settings for the outbound HTTP client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientConfig::default()
        }
    }
}
