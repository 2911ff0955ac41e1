//! Sync engine for ferrosync
//!
//! The pieces that turn buffered change summaries into runs of the external
//! sync tool:
//!
//! - [`locate`] resolves the sync executable from `PATH` or an explicit path
//! - [`SyncInvoker`] runs the tool once, bounded by a timeout
//! - [`RetryScheduler`] repeats failed runs with a capped linear backoff
//! - [`PollLoop`] drains the buffer every cycle and triggers at most one sync
//! - [`WatchSession`] wires a watch backend to all of the above
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrosync_engine::{locate, WatchSession};
//! use ferrosync_types::{NullReporter, WatchSettings};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> ferrosync_types::Result<()> {
//! let rsync = locate("rsync")?;
//! let settings = WatchSettings::new("./repo", "host:~/projects", rsync);
//! let cancel = CancellationToken::new();
//!
//! let mut session = WatchSession::new(settings, Arc::new(NullReporter), cancel.clone());
//! session.start()?;
//! session.run().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod invoker;
pub mod locator;
pub mod poll_loop;
pub mod retry;
pub mod session;

pub use invoker::{SyncInvoker, BASE_ARGS, STATUS_POLL_INTERVAL, TERMINATION_GRACE};
pub use locator::{absolute_path, locate, locate_in};
pub use poll_loop::{coalesce, PollLoop};
pub use retry::RetryScheduler;
pub use session::WatchSession;
