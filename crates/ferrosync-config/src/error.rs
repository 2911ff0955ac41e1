//! Errors raised while loading, validating or saving configuration

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file could not be read or written
    #[error("cannot access config file {}: {source}", .path.display())]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A setting holds a value the watcher cannot run with
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Dotted key of the offending setting, e.g. `sync.timeout_ms`
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The configuration could not be encoded to a file format
    #[error("cannot encode config as {format}: {message}")]
    Encode {
        /// Target format name
        format: &'static str,
        /// Encoder message
        message: String,
    },

    /// Merging or deserializing the layered sources failed
    #[error("cannot merge config sources: {0}")]
    Layering(#[from] config::ConfigError),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Reject the value at `key`
    pub fn invalid<S: Into<String>>(key: &'static str, message: S) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }

    /// Wrap an encoder failure for `format`
    pub fn encode(format: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Encode {
            format,
            message: error.to_string(),
        }
    }
}

impl From<ConfigError> for ferrosync_types::Error {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string())
    }
}
