//! Bounded retry with exponential backoff.

use std::time::Duration;

/// Configuration for retrying a whole upload attempt.
///
/// An attempt restarts from scratch: new session id, cursor at 0. A
/// partially-uploaded session is never resumed across attempts, because the
/// store offers no way to query a broken session's committed offset.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 4 means 1 try + 3 retries.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier for each subsequent retry.
    pub backoff_factor: f64,
    /// Delay cap.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Calculates the delay after a failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}
