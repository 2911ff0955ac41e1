//! Error types and handling for ferrosync
//!
//! Every failure in the watch/sync pipeline is expressed as an [`Error`]. The
//! retry scheduler relies on [`Error::should_retry`] to tell sync failures it
//! can recover from apart from fatal configuration problems.

use std::path::PathBuf;
use std::time::Duration;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - operation can continue
    Low,
    /// Medium severity - operation should be retried
    Medium,
    /// High severity - operation should be aborted
    High,
}

/// Main error type for ferrosync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// The sync executable could not be resolved
    #[error("{name} not exists or not executable")]
    ExecutableNotFound {
        /// Name or path that was looked up
        name: String,
    },

    /// Source directory is missing
    #[error("Source path not found: {path}")]
    SourceNotFound {
        /// Path that was given as source
        path: PathBuf,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// The watch subsystem could not be started or used
    #[error("Watch error: {message}")]
    Watch {
        /// Error message from the watch backend
        message: String,
    },

    /// The sync tool did not finish in time and was terminated
    #[error("sync timed out after {}ms and was terminated, return code {}", .timeout.as_millis(), format_code(.code))]
    SyncTimeout {
        /// Timeout that elapsed
        timeout: Duration,
        /// Exit code collected after termination, if any
        code: Option<i32>,
    },

    /// The sync tool exited with a non-zero status
    #[error("sync failed, return code {}", format_code(.code))]
    SyncFailed {
        /// Exit code, `None` when the child was killed by a signal
        code: Option<i32>,
    },

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

fn format_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Watch subsystem errors
    Watch,
    /// Sync tool exited non-zero
    Sync,
    /// Sync tool timed out
    Timeout,
    /// Cancellation
    Cancelled,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::ExecutableNotFound { .. } | Self::SourceNotFound { .. } | Self::Config { .. } => {
                ErrorKind::Config
            }
            Self::Watch { .. } => ErrorKind::Watch,
            Self::SyncTimeout { .. } => ErrorKind::Timeout,
            Self::SyncFailed { .. } => ErrorKind::Sync,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } => ErrorSeverity::Medium,
            Self::ExecutableNotFound { .. } | Self::SourceNotFound { .. } => ErrorSeverity::High,
            Self::Config { .. } => ErrorSeverity::High,
            Self::Watch { .. } => ErrorSeverity::High,
            Self::SyncTimeout { .. } => ErrorSeverity::Medium,
            Self::SyncFailed { .. } => ErrorSeverity::Medium,
            Self::Cancelled => ErrorSeverity::Low,
            Self::Other { .. } => ErrorSeverity::Medium,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. }
            | Self::SyncTimeout { .. }
            | Self::SyncFailed { .. }
            | Self::Other { .. } => true,
            Self::ExecutableNotFound { .. }
            | Self::SourceNotFound { .. }
            | Self::Config { .. }
            | Self::Watch { .. }
            | Self::Cancelled => false,
        }
    }

    /// Check if this error should trigger a retry
    pub fn should_retry(&self) -> bool {
        self.is_recoverable() && self.severity() <= ErrorSeverity::Medium
    }

    /// Check if this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new watch error
    pub fn watch<S: Into<String>>(message: S) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_retry_implies_recoverable(message in ".*", code in proptest::option::of(any::<i32>())) {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::Watch { message: message.clone() },
                Error::Other { message: message.clone() },
                Error::SyncFailed { code },
                Error::SyncTimeout { timeout: Duration::from_millis(10), code },
            ];

            for error in errors {
                if error.should_retry() {
                    prop_assert!(error.is_recoverable());
                    prop_assert!(error.severity() <= ErrorSeverity::Medium);
                }
            }
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
    }

    #[test]
    fn test_sync_failures_are_retried() {
        let failed = Error::SyncFailed { code: Some(2) };
        assert_eq!(failed.kind(), ErrorKind::Sync);
        assert!(failed.should_retry());
        assert_eq!(failed.to_string(), "sync failed, return code 2");

        let timeout = Error::SyncTimeout {
            timeout: Duration::from_millis(10_000),
            code: None,
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert!(timeout.should_retry());
        assert_eq!(
            timeout.to_string(),
            "sync timed out after 10000ms and was terminated, return code none"
        );
    }

    #[test]
    fn test_executable_not_found_is_fatal() {
        let error = Error::ExecutableNotFound {
            name: "rsync".to_string(),
        };

        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.severity(), ErrorSeverity::High);
        assert!(!error.should_retry());
        assert_eq!(error.to_string(), "rsync not exists or not executable");
    }

    #[test]
    fn test_watch_error_is_fatal() {
        let error = Error::watch("inotify watch limit reached");
        assert_eq!(error.kind(), ErrorKind::Watch);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_cancelled_error() {
        let error = Error::Cancelled;

        assert_eq!(error.kind(), ErrorKind::Cancelled);
        assert_eq!(error.severity(), ErrorSeverity::Low);
        assert!(error.is_cancelled());
        assert!(!error.should_retry());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "spawn failed");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.should_retry());
        assert!(error.to_string().contains("spawn failed"));
    }
}
