//! Retry loop around a [`Synchronizer`]

use ferrosync_types::{
    BackoffPolicy, Error, Result, RetryState, SyncAttempt, SyncReporter, Synchronizer,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs a synchronizer until it succeeds, backing off between failures
///
/// There is no retry limit. Only cancellation ends the loop early.
pub struct RetryScheduler<S> {
    synchronizer: S,
    backoff: BackoffPolicy,
    reporter: Arc<dyn SyncReporter>,
    cancel: CancellationToken,
}

impl<S: Synchronizer> RetryScheduler<S> {
    /// Create a scheduler
    pub fn new(
        synchronizer: S,
        backoff: BackoffPolicy,
        reporter: Arc<dyn SyncReporter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            synchronizer,
            backoff,
            reporter,
            cancel,
        }
    }

    /// The wrapped synchronizer
    pub fn synchronizer(&self) -> &S {
        &self.synchronizer
    }

    /// Sync until success; returns `Err(Error::Cancelled)` on shutdown
    pub async fn sync_with_retry(&self) -> Result<SyncAttempt> {
        let mut state = RetryState::new();

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let error = match self.synchronizer.attempt_sync().await {
                Ok(attempt) => {
                    if state.failures() > 0 {
                        info!("Sync succeeded after {} failed attempt(s)", state.failures());
                    }
                    self.reporter.report_success(&attempt);
                    return Ok(attempt);
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(error) => error,
            };

            if error.should_retry() {
                debug!("Sync attempt failed: {}", error);
            } else {
                error!("Sync attempt failed with unexpected error: {:?}", error);
            }
            self.reporter.report_failure(&error);

            let failures = state.record_failure();
            let delay = self.backoff.delay_for_failure(failures);
            self.reporter.report_retry(failures, delay);

            tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
