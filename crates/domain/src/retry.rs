//! Bounded retry with exponential backoff for lost version races.

use std::time::Duration;

/// How often and how patiently a conflicting write is retried.
///
/// # Default Values
///
/// - `max_attempts`: 3 (total write attempts, including the first)
/// - `initial_backoff`: 100ms
/// - `multiplier`: 2
/// - `max_backoff`: 1 second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of write attempts before giving up.
    pub max_attempts: u32,
    /// Delay after the first conflict.
    pub initial_backoff: Duration,
    /// Factor applied to the delay after each further conflict.
    pub multiplier: u32,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            multiplier: 2,
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately, for tests and benchmarks.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Sets the total number of attempts. Values below one are raised to one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the delay after the first conflict.
    #[must_use]
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Returns the delay to wait after `attempt` (1-based) lost its race.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Returns true if another attempt may follow `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
