//! Wiring of watcher, buffer, invoker and loop for one source tree

use crate::invoker::SyncInvoker;
use crate::locator::absolute_path;
use crate::poll_loop::PollLoop;
use crate::retry::RetryScheduler;
use ferrosync_types::{
    BackoffPolicy, Error, Result, SyncReporter, WatchBackend, WatchSettings,
};
use ferrosync_watch::{create_backend, ChangeCollector, EventBuffer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A running watch of one source directory
///
/// [`start`](Self::start) begins observing the tree and queues the initial
/// sync; [`run`](Self::run) drives syncs until the token is cancelled and
/// stops the watcher on the way out.
pub struct WatchSession {
    settings: WatchSettings,
    buffer: EventBuffer,
    backend: Box<dyn WatchBackend>,
    poll_loop: PollLoop<SyncInvoker>,
}

impl WatchSession {
    /// Build a session using the backend selected by `settings.strategy`
    pub fn new(
        settings: WatchSettings,
        reporter: Arc<dyn SyncReporter>,
        cancel: CancellationToken,
    ) -> Self {
        let backend = create_backend(settings.strategy, settings.polling_interval);
        Self::with_backend(settings, backend, reporter, cancel)
    }

    /// Build a session around an explicit backend
    pub fn with_backend(
        settings: WatchSettings,
        backend: Box<dyn WatchBackend>,
        reporter: Arc<dyn SyncReporter>,
        cancel: CancellationToken,
    ) -> Self {
        let buffer = EventBuffer::new();
        let invoker = SyncInvoker::new(settings.clone(), cancel.clone());
        let scheduler = RetryScheduler::new(
            invoker,
            BackoffPolicy::new(settings.duration),
            reporter.clone(),
            cancel.clone(),
        );
        let poll_loop = PollLoop::new(
            buffer.clone(),
            scheduler,
            settings.duration,
            reporter,
            cancel,
        );

        Self {
            settings,
            buffer,
            backend,
            poll_loop,
        }
    }

    /// Buffer the watcher feeds
    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Whether the watcher is currently delivering events
    pub fn is_watching(&self) -> bool {
        self.backend.is_running()
    }

    /// Start watching the source tree recursively and queue the initial sync
    pub fn start(&mut self) -> Result<PathBuf> {
        if !self.settings.source.is_dir() {
            return Err(Error::SourceNotFound {
                path: self.settings.source.clone(),
            });
        }

        let root = absolute_path(&self.settings.source)?;
        let handler = ChangeCollector::new(self.buffer.clone()).into_handler();
        self.backend.register(&root, true, handler)?;
        self.backend.start()?;

        info!(
            "Watching {} ({} watcher), syncing to {}",
            root.display(),
            self.settings.strategy,
            self.settings.destination
        );
        self.buffer.push(format!("watching {}", root.display()));
        Ok(root)
    }

    /// Drive syncs until cancelled, then stop the watcher
    pub async fn run(&mut self) -> Result<()> {
        let result = self.poll_loop.run().await;
        self.stop();
        result
    }

    /// Stop the watcher; idempotent
    pub fn stop(&mut self) {
        if self.backend.is_running() {
            self.backend.stop();
            info!("Watcher stopped");
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}
