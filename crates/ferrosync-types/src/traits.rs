//! Core traits for ferrosync
//!
//! These are the seams between the watch subsystem, the sync engine and
//! whatever front end reports progress to the user.

use crate::{ChangeEvent, Error, Result, SyncAttempt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use async_trait::async_trait;

/// Receives change events from a watch backend
///
/// Called on the backend's own thread, so implementations must be cheap and
/// thread-safe.
pub trait ChangeHandler: Send + Sync {
    /// Handle one filesystem change
    fn on_event(&self, event: ChangeEvent);
}

/// Filesystem watch subsystem
pub trait WatchBackend: Send {
    /// Register a path to watch before the backend is started
    fn register(&mut self, path: &Path, recursive: bool, handler: Arc<dyn ChangeHandler>)
        -> Result<()>;

    /// Start delivering events for every registered path
    fn start(&mut self) -> Result<()>;

    /// Stop delivering events; calling it twice is harmless
    fn stop(&mut self);

    /// Whether the backend is currently delivering events
    fn is_running(&self) -> bool;
}

/// Trait for reporting what the poll loop is doing
pub trait SyncReporter: Send + Sync {
    /// A coalesced change summary is about to be synced
    fn report_batch(&self, summary: &str);

    /// A sync attempt failed
    fn report_failure(&self, error: &Error);

    /// A retry is scheduled after `delay`; `attempt` counts from 1
    fn report_retry(&self, attempt: u32, delay: Duration);

    /// A sync attempt succeeded
    fn report_success(&self, attempt: &SyncAttempt);
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl SyncReporter for NullReporter {
    fn report_batch(&self, _summary: &str) {}

    fn report_failure(&self, _error: &Error) {}

    fn report_retry(&self, _attempt: u32, _delay: Duration) {}

    fn report_success(&self, _attempt: &SyncAttempt) {}
}

/// Something that can run one sync of the watched tree
#[cfg(feature = "async")]
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Run the sync once, bounded by the configured timeout
    async fn attempt_sync(&self) -> Result<SyncAttempt>;
}
