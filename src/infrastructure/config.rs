//! Configuration management
//!
//! Loads configuration from config.toml at startup.
//! Every section is optional; missing values fall back to defaults.

use crate::core::registry::{self, RegistryError, SymbolRegistry};
use crate::snapshot::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest accepted snapshot interval (one day)
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Tracker configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Upstream WebSocket settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Where the tracked symbol list comes from
    #[serde(default)]
    pub symbols: SymbolsConfig,

    /// Snapshot cadence, retention and persistence
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Feed connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// WebSocket endpoint (ws:// or wss://)
    #[serde(default = "default_feed_url")]
    pub url: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on waiting for the receive loop to close
    #[serde(default = "default_disconnect_timeout")]
    pub disconnect_timeout_secs: u64,

    /// Delay between connecting and the first scheduled snapshot
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
}

/// Symbol source. `list` wins over `path`; neither means the built-in list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SymbolsConfig {
    #[serde(default)]
    pub list: Option<Vec<String>>,

    /// `common_symbols` JSON document
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Snapshot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_snapshot_file")]
    pub file: PathBuf,

    /// Reload the persisted file into the buffer before connecting
    #[serde(default)]
    pub restore_on_start: bool,

    #[serde(default)]
    pub retention: RetentionPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// `EnvFilter` directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Console only when false
    #[serde(default = "default_true")]
    pub file_output: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            connect_timeout_secs: default_connect_timeout(),
            disconnect_timeout_secs: default_disconnect_timeout(),
            warmup_ms: default_warmup_ms(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            file: default_snapshot_file(),
            restore_on_start: false,
            retention: RetentionPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            filter: default_log_filter(),
            file_output: true,
        }
    }
}

fn default_feed_url() -> String {
    crate::exchanges::BinanceFeed::WS_URL.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_disconnect_timeout() -> u64 {
    5
}

fn default_warmup_ms() -> u64 {
    2_000
}

fn default_interval_secs() -> u64 {
    5
}

fn default_snapshot_file() -> PathBuf {
    PathBuf::from("price_snapshots.json")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl FeedConfig {
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[inline]
    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.disconnect_timeout_secs)
    }

    #[inline]
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

impl SymbolsConfig {
    /// Build the registry from whichever source is configured
    pub fn build_registry(&self) -> Result<SymbolRegistry, RegistryError> {
        match (&self.list, &self.path) {
            (Some(list), _) => SymbolRegistry::new(list),
            (None, Some(path)) => SymbolRegistry::load_file(path),
            (None, None) => registry::initialize_with_defaults(),
        }
    }
}

impl SnapshotConfig {
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load configuration from the file named by CONFIG_PATH (default config.toml)
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reject values the tracker cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.feed.url)
            .map_err(|e| ConfigError::Invalid(format!("feed.url {:?}: {}", self.feed.url, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "feed.url must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }

        if self.snapshot.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "snapshot.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.snapshot.interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "snapshot.interval_secs must be at most {}, got {}",
                MAX_INTERVAL_SECS, self.snapshot.interval_secs
            )));
        }

        if let RetentionPolicy::Fifo { capacity: 0 } = self.snapshot.retention {
            return Err(ConfigError::Invalid(
                "snapshot.retention.capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
