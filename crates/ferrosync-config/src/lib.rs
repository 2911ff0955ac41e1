//! Configuration management system for ferrosync
//!
//! Settings are layered from built-in defaults, an optional YAML/TOML/JSON
//! file, `FERROSYNC__*` environment variables and finally command-line
//! flags (applied by the binary on top of the loaded [`Config`]).
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("ferrosync.yaml")
//!     .add_env_prefix("FERROSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Sync timeout: {}ms", config.sync.timeout_ms);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferrosync_types::{WatchSettings, WatchStrategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for ferrosync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Watching and polling
    pub watch: WatchConfig,
    /// External sync tool
    pub sync: SyncConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Build the immutable session settings for a source/destination pair
    ///
    /// `executable` is the already resolved path of the sync tool.
    pub fn watch_settings(
        &self,
        source: impl Into<PathBuf>,
        destination: impl Into<String>,
        executable: impl Into<PathBuf>,
    ) -> WatchSettings {
        WatchSettings {
            source: source.into(),
            destination: destination.into(),
            duration: Duration::from_millis(self.watch.duration_ms),
            timeout: Duration::from_millis(self.sync.timeout_ms),
            strategy: self.watch.strategy(),
            polling_interval: Duration::from_millis(self.watch.polling_interval_ms),
            executable: executable.into(),
            excludes: self.sync.exclude.clone(),
        }
    }
}

/// Watch-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Poll-loop interval in milliseconds
    pub duration_ms: u64,
    /// Use the polling watcher instead of OS notifications
    pub polling: bool,
    /// Rescan interval of the polling watcher in milliseconds
    pub polling_interval_ms: u64,
}

impl WatchConfig {
    /// Watch strategy selected by this configuration
    pub fn strategy(&self) -> WatchStrategy {
        if self.polling {
            WatchStrategy::Polling
        } else {
            WatchStrategy::Native
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            polling: false,
            polling_interval_ms: 1000,
        }
    }
}

/// External sync tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Executable name (looked up in PATH) or path
    pub executable: String,
    /// Timeout for one sync run in milliseconds
    pub timeout_ms: u64,
    /// Extra exclusion patterns passed as `--exclude`
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            executable: "rsync".to_string(),
            timeout_ms: 30_000,
            exclude: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}
