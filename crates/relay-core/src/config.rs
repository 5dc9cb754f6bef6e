//! Configuration surface read by the forwarding path.
//!
//! The forwarder and health monitor read a fresh [`ConfigSnapshot`] at
//! every decision point rather than caching one, so configuration
//! changes take effect on the next cycle without a restart. No
//! consistency is assumed across reads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

/// Environment variable prefix for overrides, e.g. `OTP_RELAY_BACKEND_URL`.
pub const ENV_PREFIX: &str = "OTP_RELAY_";

/// Point-in-time view of the user-controlled settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Backend base URL as entered by the user. May lack a scheme and
    /// the submission suffix; the forwarder normalizes it.
    #[serde(default)]
    pub backend_url: String,

    /// Shared auth secret, sent in the `X-Auth-Key` header and used as
    /// the cipher passphrase in encrypted payload mode.
    #[serde(default)]
    pub secret: String,

    /// Whether forwarding is enabled at all.
    #[serde(default)]
    pub notify_enabled: bool,

    /// Recipient identifiers carried verbatim in each forwarded record.
    #[serde(default)]
    pub recipient_ids: String,
}

impl ConfigSnapshot {
    /// Whether the integration is configured well enough to attempt a
    /// send. A false answer is an expected, non-exceptional state.
    pub fn is_complete(&self) -> bool {
        self.notify_enabled && !self.backend_url.is_empty() && !self.secret.is_empty()
    }
}

/// Source of current configuration, read fresh per decision point.
#[async_trait]
pub trait ConfigStore: Send + Sync + std::fmt::Debug {
    /// Returns the configuration as of this moment.
    async fn snapshot(&self) -> ConfigSnapshot;
}

/// Config store backed by a TOML file with environment overrides.
///
/// The file is re-read on every `snapshot` call; an unreadable or
/// malformed file degrades to defaults (forwarding disabled) with a
/// warning rather than failing the pipeline.
#[derive(Debug)]
pub struct FigmentConfigStore {
    path: PathBuf,
}

impl FigmentConfigStore {
    /// Creates a store reading from the given TOML file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl ConfigStore for FigmentConfigStore {
    async fn snapshot(&self) -> ConfigSnapshot {
        let figment = Figment::new()
            .merge(Serialized::defaults(ConfigSnapshot::default()))
            .merge(Toml::file(&self.path))
            .merge(Env::prefixed(ENV_PREFIX));

        match figment.extract() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to read settings, treating integration as unconfigured");
                ConfigSnapshot::default()
            },
        }
    }
}

/// In-memory config store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    inner: RwLock<ConfigSnapshot>,
}

impl MemoryConfigStore {
    /// Creates a store holding the given snapshot.
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self { inner: RwLock::new(snapshot) }
    }

    /// Replaces the stored snapshot. Takes effect on the next read.
    pub async fn set(&self, snapshot: ConfigSnapshot) {
        *self.inner.write().await = snapshot;
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn snapshot(&self) -> ConfigSnapshot {
        self.inner.read().await.clone()
    }
}
