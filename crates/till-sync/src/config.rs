//! # Queue Configuration
//!
//! Configuration for the sale endpoint and the offline queue worker.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILLPOINT_ENDPOINT_URL=https://api.example.com/sales               │
//! │     TILLPOINT_DRAIN_INTERVAL_SECS=15                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tillpoint/queue.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tillpoint.tillpoint/queue.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # queue.toml
//! endpoint_url = "https://api.example.com/sales"
//! database_path = "/var/lib/tillpoint/queue.db"
//! drain_interval_secs = 15
//! connect_timeout_secs = 5
//! request_timeout_secs = 10
//! attempts_warn_threshold = 10
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Queue Configuration
// =============================================================================

/// Configuration for submission and the background drain worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// URL of the sale creation endpoint.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Path to the SQLite file backing the offline queue.
    /// `None` resolves to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Interval between background drain cycles (seconds).
    #[serde(default = "default_drain_interval")]
    pub drain_interval_secs: u64,

    /// TCP connect timeout for the endpoint (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// End-to-end request timeout for the endpoint (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Attempt count at which a stuck queue entry is logged loudly.
    /// Entries are never dropped, whatever the count.
    #[serde(default = "default_attempts_warn_threshold")]
    pub attempts_warn_threshold: i64,
}

fn default_endpoint_url() -> String {
    "http://localhost:8080/api/sales".to_string()
}

fn default_drain_interval() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_attempts_warn_threshold() -> i64 {
    10
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            endpoint_url: default_endpoint_url(),
            database_path: None,
            drain_interval_secs: default_drain_interval(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            attempts_warn_threshold: default_attempts_warn_threshold(),
        }
    }
}

impl QueueConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (queue.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading queue config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load queue config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Queue config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.endpoint_url.is_empty() {
            return Err(SyncError::InvalidConfig("endpoint_url is empty".into()));
        }
        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://") {
            return Err(SyncError::InvalidConfig(format!(
                "endpoint_url must be http(s): '{}'",
                self.endpoint_url
            )));
        }
        if self.drain_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "drain_interval_secs must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TILLPOINT_ENDPOINT_URL") {
            debug!(url = %url, "Overriding endpoint URL from environment");
            self.endpoint_url = url;
        }

        if let Ok(secs) = std::env::var("TILLPOINT_DRAIN_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => {
                    debug!(secs = s, "Overriding drain interval from environment");
                    self.drain_interval_secs = s;
                }
                Err(_) => warn!(value = %secs, "Ignoring non-numeric TILLPOINT_DRAIN_INTERVAL_SECS"),
            }
        }

        if let Ok(path) = std::env::var("TILLPOINT_QUEUE_DB") {
            debug!(path = %path, "Overriding queue database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }
    }

    /// Resolves the SQLite file path, falling back to the platform data dir.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "tillpoint", "tillpoint")
                .map(|dirs| dirs.data_dir().join("queue.db"))
        })
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tillpoint", "tillpoint")
            .map(|dirs| dirs.config_dir().join("queue.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
