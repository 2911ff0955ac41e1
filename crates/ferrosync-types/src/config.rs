//! Retry timing for failed syncs

use std::time::Duration;

/// Linear, capped backoff between sync retries
///
/// After the k-th consecutive failure the scheduler waits
/// `min(max_multiplier, k - 1) * step`, so the first retry is immediate and
/// the wait never exceeds `max_multiplier * step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackoffPolicy {
    /// Delay added per failure
    pub step: Duration,
    /// Cap on the step multiplier
    pub max_multiplier: u32,
}

impl BackoffPolicy {
    /// Default multiplier cap
    pub const DEFAULT_MAX_MULTIPLIER: u32 = 10;

    /// Create a policy with the default cap
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            max_multiplier: Self::DEFAULT_MAX_MULTIPLIER,
        }
    }

    /// Delay to wait after the `failures`-th consecutive failure (1-based)
    pub fn delay_for_failure(&self, failures: u32) -> Duration {
        let multiplier = failures.saturating_sub(1).min(self.max_multiplier);
        self.step.saturating_mul(multiplier)
    }

    /// Longest delay this policy can produce
    pub fn max_delay(&self) -> Duration {
        self.step.saturating_mul(self.max_multiplier)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

/// Consecutive-failure counter for one change batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    failures: u32,
}

impl RetryState {
    /// Fresh state with no failures
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return the new count
    pub fn record_failure(&mut self) -> u32 {
        self.failures = self.failures.saturating_add(1);
        self.failures
    }

    /// Number of consecutive failures so far
    pub fn failures(self) -> u32 {
        self.failures
    }

    /// Forget all failures
    pub fn reset(&mut self) {
        self.failures = 0;
    }
}
