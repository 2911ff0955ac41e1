//! Watch backends built on `notify`
//!
//! Both backends implement [`WatchBackend`]: paths are registered first and
//! nothing is delivered until [`WatchBackend::start`]. Each registration gets
//! its own notify watcher so events route straight to their handler.

use crate::convert::EventTranslator;
use ferrosync_types::{ChangeHandler, Error, Result, WatchBackend, WatchStrategy};
use notify::{EventHandler, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

struct Registration {
    path: PathBuf,
    recursive: bool,
    handler: Arc<dyn ChangeHandler>,
}

/// Feeds one registration's notify events through its translator
struct Dispatch {
    translator: EventTranslator,
    handler: Arc<dyn ChangeHandler>,
}

impl EventHandler for Dispatch {
    fn handle_event(&mut self, result: notify::Result<notify::Event>) {
        match result {
            Ok(event) => {
                debug!("File system event: {:?}", event);
                for change in self.translator.translate(&event) {
                    self.handler.on_event(change);
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        }
    }
}

/// Registrations plus the live notify watchers created from them
struct WatcherSet<W> {
    registrations: Vec<Registration>,
    active: Vec<W>,
}

impl<W: Watcher> WatcherSet<W> {
    fn new() -> Self {
        Self {
            registrations: Vec::new(),
            active: Vec::new(),
        }
    }

    fn register(
        &mut self,
        path: &Path,
        recursive: bool,
        handler: Arc<dyn ChangeHandler>,
    ) -> Result<()> {
        if !self.active.is_empty() {
            return Err(Error::watch("cannot register paths on a running watcher"));
        }
        self.registrations.push(Registration {
            path: path.to_path_buf(),
            recursive,
            handler,
        });
        Ok(())
    }

    fn start(&mut self, config: notify::Config, label: &str) -> Result<()> {
        if !self.active.is_empty() {
            return Err(Error::watch("watcher is already running"));
        }
        if self.registrations.is_empty() {
            return Err(Error::watch("no paths registered"));
        }

        for registration in &self.registrations {
            match Self::spawn(registration, config.clone()) {
                Ok(watcher) => self.active.push(watcher),
                Err(e) => {
                    self.active.clear();
                    return Err(e);
                }
            }
            info!(
                "Started {} watcher on {} (recursive: {})",
                label,
                registration.path.display(),
                registration.recursive
            );
        }
        Ok(())
    }

    fn spawn(registration: &Registration, config: notify::Config) -> Result<W> {
        let dispatch = Dispatch {
            translator: EventTranslator::seeded(&registration.path, registration.recursive),
            handler: Arc::clone(&registration.handler),
        };
        let mut watcher = W::new(dispatch, config).map_err(|e| Error::watch(format!("failed to create watcher: {}", e)))?;

        let mode = if registration.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&registration.path, mode).map_err(|e| {
            Error::watch(format!(
                "failed to watch {}: {}",
                registration.path.display(),
                e
            ))
        })?;

        Ok(watcher)
    }

    fn stop(&mut self) {
        if !self.active.is_empty() {
            // Dropping a notify watcher unregisters its paths
            self.active.clear();
            info!("Stopped watching {} path(s)", self.registrations.len());
        }
    }

    fn is_running(&self) -> bool {
        !self.active.is_empty()
    }
}

/// Backend using OS change notifications
pub struct NativeBackend {
    watchers: WatcherSet<RecommendedWatcher>,
}

impl NativeBackend {
    /// Create a backend with no registered paths
    pub fn new() -> Self {
        Self {
            watchers: WatcherSet::new(),
        }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchBackend for NativeBackend {
    fn register(
        &mut self,
        path: &Path,
        recursive: bool,
        handler: Arc<dyn ChangeHandler>,
    ) -> Result<()> {
        self.watchers.register(path, recursive, handler)
    }

    fn start(&mut self) -> Result<()> {
        self.watchers.start(notify::Config::default(), "native")
    }

    fn stop(&mut self) {
        self.watchers.stop();
    }

    fn is_running(&self) -> bool {
        self.watchers.is_running()
    }
}

/// Backend that rescans the tree at a fixed interval
pub struct PollingBackend {
    interval: Duration,
    watchers: WatcherSet<PollWatcher>,
}

impl PollingBackend {
    /// Create a backend rescanning every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            watchers: WatcherSet::new(),
        }
    }
}

impl WatchBackend for PollingBackend {
    fn register(
        &mut self,
        path: &Path,
        recursive: bool,
        handler: Arc<dyn ChangeHandler>,
    ) -> Result<()> {
        self.watchers.register(path, recursive, handler)
    }

    fn start(&mut self) -> Result<()> {
        let config = notify::Config::default().with_poll_interval(self.interval);
        self.watchers.start(config, "polling")
    }

    fn stop(&mut self) {
        self.watchers.stop();
    }

    fn is_running(&self) -> bool {
        self.watchers.is_running()
    }
}

/// Create the backend for a watch strategy
pub fn create_backend(strategy: WatchStrategy, polling_interval: Duration) -> Box<dyn WatchBackend> {
    match strategy {
        WatchStrategy::Native => Box::new(NativeBackend::new()),
        WatchStrategy::Polling => Box::new(PollingBackend::new(polling_interval)),
    }
}
