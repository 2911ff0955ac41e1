//! Core type system and error handling for ferrosync
//!
//! This crate provides the foundational types shared by every ferrosync crate:
//!
//! - **Error handling**: one error enum with kind, severity and retry hints
//! - **Core types**: change events, watch settings and sync attempt records
//! - **Traits**: seams for watch backends, synchronizers and reporters
//! - **Backoff**: the capped linear retry delay
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `async`: Enable the async [`Synchronizer`] trait
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_types::{ChangeEvent, ChangeKind, EntryType};
//!
//! let event = ChangeEvent::new(ChangeKind::Modified, EntryType::File, "repo/src/lib.rs");
//! assert!(!event.is_git_internal());
//! assert!(event.render().contains("modified file: repo/src/lib.rs"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{BackoffPolicy, RetryState};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;
