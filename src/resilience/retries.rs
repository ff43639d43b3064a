//! Retry policy.
//!
//! A request gets one initial attempt plus `max_retries` retries. Before
//! each retry the transport waits for the linear backoff delay.

use std::time::Duration;

use crate::resilience::backoff::linear_backoff;

/// Retries beyond the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff step: retry `n` waits `n * step`.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl RetryPolicy {
    /// Total attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        linear_backoff(retry, self.backoff_step)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}
