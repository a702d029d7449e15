//! The `Config` struct and its YAML persistence.
//!
//! Covers:
//! - `load` / `save` (YAML file I/O with atomic write)
//! - Path helpers (`config_path`, `config_dir`)
//! - `validate` for values that parse but make no sense at runtime

use crate::defaults;
use crate::error::ConfigError;
use crate::types::{LogLevel, SortMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // ========================================================================
    // Sync
    // ========================================================================
    /// Base URL of the persistence service (`GET /tabs`, `POST /tabs`)
    #[serde(default = "defaults::server_url")]
    pub server_url: String,

    /// Push tree snapshots to the persistence service after mutations
    #[serde(default = "defaults::bool_true")]
    pub sync_enabled: bool,

    /// Quiet period before a coalesced snapshot is sent, in milliseconds
    #[serde(default = "defaults::sync_debounce_ms")]
    pub sync_debounce_ms: u64,

    /// Per-request timeout for the persistence service, in seconds
    #[serde(default = "defaults::sync_timeout_secs")]
    pub sync_timeout_secs: u64,

    /// Send `DELETE /tabs/{id}` for cascade-deleted items.
    /// Off by default: the stock service only implements GET and POST.
    #[serde(default = "defaults::bool_false")]
    pub propagate_deletes: bool,

    // ========================================================================
    // Tree
    // ========================================================================
    /// Literal prefix of default titles in the root window ("Note 1", "Note 2", ...)
    #[serde(default = "defaults::title_prefix")]
    pub title_prefix: String,

    /// Lineage label written as `fromParent` for items in the root window
    #[serde(default = "defaults::root_label")]
    pub root_label: String,

    /// Sort mode applied to windows that have no explicit sort selected
    #[serde(default)]
    pub default_sort: SortMode,

    // ========================================================================
    // Logging
    // ========================================================================
    /// Log level used when neither `--log-level` nor `RUST_LOG` is given
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: defaults::server_url(),
            sync_enabled: defaults::bool_true(),
            sync_debounce_ms: defaults::sync_debounce_ms(),
            sync_timeout_secs: defaults::sync_timeout_secs(),
            propagate_deletes: defaults::bool_false(),
            title_prefix: defaults::title_prefix(),
            root_label: defaults::root_label(),
            default_sort: SortMode::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file
    ///
    /// A missing or empty file yields `Config::default()`; malformed YAML
    /// or an invalid value is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            log::info!("Config file {:?} is empty, using defaults", path);
            return Ok(Self::default());
        }

        let config: Config = serde_yaml_ng::from_str(&contents)?;
        config.validate()?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values that deserialize fine but cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server_url must not be empty".to_string(),
            ));
        }
        if self.root_label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "root_label must not be empty".to_string(),
            ));
        }
        if self.sync_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "sync_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Debounce window as a `Duration`
    pub fn sync_debounce(&self) -> Duration {
        Duration::from_millis(self.sync_debounce_ms)
    }

    /// Request timeout as a `Duration`
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Get the configuration file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("par-notes")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("par-notes")
            } else {
                PathBuf::from(".")
            }
        }
    }
}
