//! ferrosync integration testing support
//!
//! Shared fixtures for the end-to-end tests in `tests/`: shell-script
//! stand-ins for rsync and a reporter that records what the engine reports.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Fake sync tools and recording reporters used across the integration tests.
pub mod test_utils;
