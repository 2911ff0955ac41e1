//! Periodic drain of the event buffer

use crate::retry::RetryScheduler;
use ferrosync_types::{Result, SyncReporter, Synchronizer};
use ferrosync_watch::EventBuffer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Collapse drained summaries into the message shown for one sync
///
/// The newest summary is kept; older ones only contribute to the count.
pub fn coalesce(mut summaries: Vec<String>) -> Option<String> {
    let count = summaries.len();
    let newest = summaries.pop()?;
    if count > 1 {
        Some(format!("{} and ...{} events", newest, count - 1))
    } else {
        Some(newest)
    }
}

/// Drives one sync per non-empty drain of the buffer
pub struct PollLoop<S> {
    buffer: EventBuffer,
    scheduler: RetryScheduler<S>,
    duration: Duration,
    reporter: Arc<dyn SyncReporter>,
    cancel: CancellationToken,
}

impl<S: Synchronizer> PollLoop<S> {
    /// Create a loop sleeping `duration` between cycles
    pub fn new(
        buffer: EventBuffer,
        scheduler: RetryScheduler<S>,
        duration: Duration,
        reporter: Arc<dyn SyncReporter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            buffer,
            scheduler,
            duration,
            reporter,
            cancel,
        }
    }

    /// Run a single cycle; returns whether a sync was triggered
    pub async fn poll_once(&self) -> Result<bool> {
        let Some(message) = coalesce(self.buffer.take()) else {
            return Ok(false);
        };

        debug!("Change batch: {}", message);
        self.reporter.report_batch(&message);
        self.scheduler.sync_with_retry().await?;
        Ok(true)
    }

    /// Loop until cancelled
    ///
    /// Sync time is not subtracted from the sleep, so a cycle takes at least
    /// `duration` plus however long the sync took.
    pub async fn run(&self) -> Result<()> {
        info!("Poll loop started, interval {:?}", self.duration);

        while !self.cancel.is_cancelled() {
            match self.poll_once().await {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => break,
                Err(e) => return Err(e),
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.duration) => {}
            }
        }

        info!("Poll loop stopped");
        Ok(())
    }
}
