//! Retry budget and backoff for question acquisition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed attempt budget with an asymmetric pause.
///
/// The first data failure (no rows, invalid row) waits
/// `first_retry_delay_secs`; later failures and every transport failure wait
/// the longer `retry_delay_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub first_retry_delay_secs: u64,
    pub retry_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            first_retry_delay_secs: 2,
            retry_delay_secs: 3,
        }
    }
}

impl RetryPolicy {
    /// Pause after the `failed_attempt`-th failure (1-based), or `None` when
    /// the budget is spent and no further attempt follows.
    pub fn delay_after(&self, failed_attempt: u32, transport_failure: bool) -> Option<Duration> {
        if failed_attempt == 0 || failed_attempt >= self.max_attempts {
            return None;
        }
        let secs = if failed_attempt == 1 && !transport_failure {
            self.first_retry_delay_secs
        } else {
            self.retry_delay_secs
        };
        Some(Duration::from_secs(secs))
    }

    /// Worst-case time spent sleeping between attempts.
    pub fn max_total_delay(&self) -> Duration {
        (1..self.max_attempts)
            .filter_map(|n| self.delay_after(n, true))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backoff_is_two_then_three_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1, false), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(2, false), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_after(3, false), None);
    }

    #[test]
    fn transport_failures_always_wait_longer() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1, true), Some(Duration::from_secs(3)));
        assert_eq!(policy.max_total_delay(), Duration::from_secs(6));
    }

    #[test]
    fn longer_budget_keeps_second_delay() {
        let policy = RetryPolicy {
            max_attempts: 5,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(4, false), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_after(5, false), None);
    }
}
