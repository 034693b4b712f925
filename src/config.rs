//! Configuration file parser for ~/.config/quoteshelf/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for each so
//! typos are visible.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::util::{validate_endpoint, EndpointError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid sync endpoint: {0}")]
    Endpoint(#[from] EndpointError),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote collection to reconcile against (GET) and push new quotes to (POST).
    pub endpoint: String,

    /// Seconds between sync cycles. Clamped to 10..=60 on use.
    pub sync_interval_secs: u64,

    /// Category assigned to remote items that carry none.
    pub default_remote_category: String,

    /// Push newly added quotes to the endpoint. Set to `false` to keep adds local.
    pub push_on_add: bool,

    /// Column budget for rendered quotes.
    pub display_width: usize,

    /// Per-request timeout for sync traffic.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "https://jsonplaceholder.typicode.com/posts".to_string(),
            sync_interval_secs: 30,
            default_remote_category: "Server".to_string(),
            push_on_add: true,
            display_width: 80,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Maximum config file size (64 KB).
    const MAX_FILE_SIZE: u64 = 65_536;

    pub const MIN_SYNC_INTERVAL_SECS: u64 = 10;
    pub const MAX_SYNC_INTERVAL_SECS: u64 = 60;

    const KNOWN_KEYS: [&'static str; 6] = [
        "endpoint",
        "sync_interval_secs",
        "default_remote_category",
        "push_on_add",
        "display_width",
        "request_timeout_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Endpoint that is not an http(s) URL → `Err(ConfigError::Endpoint)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        validate_endpoint(&config.endpoint)?;
        tracing::info!(
            endpoint = %config.endpoint,
            interval_secs = config.sync_interval(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Sync interval in seconds, clamped to the supported 10..=60 window.
    pub fn sync_interval(&self) -> u64 {
        self.sync_interval_secs
            .clamp(Self::MIN_SYNC_INTERVAL_SECS, Self::MAX_SYNC_INTERVAL_SECS)
    }

    pub fn sync_period(&self) -> Duration {
        Duration::from_secs(self.sync_interval())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================
