//! Change event collection
//!
//! The collector is the [`ChangeHandler`] handed to every watch backend. It
//! renders events into one-line summaries and appends them to the shared
//! [`EventBuffer`], which the poll loop drains once per cycle.

use ferrosync_types::{ChangeEvent, ChangeHandler};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Ordered buffer of rendered change summaries
///
/// Written from the watcher thread, drained by the poll loop. There is no
/// size cap; the poll loop empties it every cycle.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    entries: Arc<Mutex<Vec<Entry>>>,
}

#[derive(Debug)]
struct Entry {
    summary: String,
    rename: Option<usize>,
}

impl EventBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a summary line
    pub fn push(&self, entry: impl Into<String>) {
        self.lock().push(Entry {
            summary: entry.into(),
            rename: None,
        });
    }

    /// Append one half of a rename, tagged with its tracker
    pub fn push_rename_half(&self, tracker: usize, entry: impl Into<String>) {
        self.lock().push(Entry {
            summary: entry.into(),
            rename: Some(tracker),
        });
    }

    /// Append a complete rename, dropping its halves still buffered
    pub fn push_rename(&self, tracker: usize, entry: impl Into<String>) {
        let mut entries = self.lock();
        entries.retain(|e| e.rename != Some(tracker));
        entries.push(Entry {
            summary: entry.into(),
            rename: None,
        });
    }

    /// Remove and return everything buffered so far, oldest first
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
            .into_iter()
            .map(|e| e.summary)
            .collect()
    }

    /// Number of buffered entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Filters and records change events into an [`EventBuffer`]
#[derive(Debug, Clone)]
pub struct ChangeCollector {
    buffer: EventBuffer,
}

impl ChangeCollector {
    /// Create a collector writing into `buffer`
    pub fn new(buffer: EventBuffer) -> Self {
        Self { buffer }
    }

    /// Collector as a shareable handler for watch backends
    pub fn into_handler(self) -> Arc<dyn ChangeHandler> {
        Arc::new(self)
    }
}

impl ChangeHandler for ChangeCollector {
    fn on_event(&self, event: ChangeEvent) {
        if event.is_git_internal() {
            trace!("Ignoring git metadata change: {}", event.path.display());
            return;
        }
        // inotify reports a rename as both halves and then the pair
        match (event.tracker, event.dest_path.is_some()) {
            (Some(tracker), true) => self.buffer.push_rename(tracker, event.render()),
            (Some(tracker), false) => self.buffer.push_rename_half(tracker, event.render()),
            (None, _) => self.buffer.push(event.render()),
        }
    }
}
