//! Filesystem change collection and watch backends for ferrosync
//!
//! This crate turns raw filesystem notifications into the rendered summaries
//! the poll loop coalesces:
//!
//! - [`NativeBackend`] and [`PollingBackend`] deliver events from `notify`
//! - [`ChangeCollector`] filters out `.git` internals and renders each event
//! - [`EventBuffer`] holds the summaries until the next poll cycle
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrosync_types::{WatchBackend, WatchStrategy};
//! use ferrosync_watch::{create_backend, ChangeCollector, EventBuffer};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # fn example() -> ferrosync_types::Result<()> {
//! let buffer = EventBuffer::new();
//! let mut backend = create_backend(WatchStrategy::Native, Duration::from_secs(1));
//! backend.register(Path::new("./repo"), true, ChangeCollector::new(buffer.clone()).into_handler())?;
//! backend.start()?;
//! // ... later
//! let pending = buffer.take();
//! backend.stop();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod collector;
pub mod convert;

pub use backend::{create_backend, NativeBackend, PollingBackend};
pub use collector::{ChangeCollector, EventBuffer};
pub use convert::EventTranslator;
