use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{MeteoError, Result};

pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "MeteoIngestor/1.0";
pub const DEFAULT_DATABASE_FILE: &str = "meteo.db";
pub const DEFAULT_SNAPSHOT_FILE: &str = "data.json";
pub const DEFAULT_CONFIG_FILE: &str = "meteo.toml";

/// Top-level config (meteo.toml + METEO_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Where the XML document comes from and how often it is polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Absolute URL of the XML document. Required at startup.
    pub source_url: Option<String>,
    /// Minutes between cycles. Values below 1 are raised to 1.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
    /// Per-request timeout for the HTTP GET.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// File locations. Relative paths resolve against the application root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Begin in the running phase instead of waiting for `start`.
    #[serde(default)]
    pub start_running: bool,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MINUTES
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_database_path() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}
fn default_snapshot_path() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

impl IngestConfig {
    /// Load config from a TOML file with METEO_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `METEO_DATA_SOURCE__SOURCE_URL`. A missing file yields defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        tracing::debug!(path = %config_path.display(), "loading configuration");
        let config: IngestConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("METEO_").split("__"))
            .extract()
            .map_err(|e| MeteoError::Config(e.to_string()))?;

        Ok(config)
    }

    /// The configured source URL, trimmed. Blank counts as missing.
    pub fn source_url(&self) -> Result<&str> {
        self.data_source
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(MeteoError::MissingSourceUrl)
    }

    /// Poll interval, never shorter than one minute.
    pub fn poll_interval(&self) -> Duration {
        let minutes = self.data_source.poll_interval_minutes.max(1);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.data_source.timeout_secs.max(1))
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.database_path)
    }

    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.snapshot_path)
    }
}

/// Default config file location under the application root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
