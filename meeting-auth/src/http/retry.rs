//! Simple exponential backoff retry policy.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

/// Exponential backoff retry policy.
///
/// Retry `n` (zero-based) waits `base_delay * 2^n`, capped at `max_delay`, until
/// `max_attempts` total attempts have been made.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl BackoffPolicy {
    /// Create a new retry policy with a one second base delay.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Total attempts, including the first one
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_retries: max_attempts.max(1) - 1,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate exponential backoff delay.
    fn exponential_delay(&self, n_past_retries: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * 2_f64.powi(n_past_retries as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            RetryDecision::DoNotRetry
        } else {
            let delay = self.exponential_delay(n_past_retries);
            RetryDecision::Retry {
                execute_after: SystemTime::now() + delay,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delay() {
        let policy = BackoffPolicy::new(3);

        assert_eq!(policy.exponential_delay(0).as_secs(), 1);
        assert_eq!(policy.exponential_delay(1).as_secs(), 2);
        assert_eq!(policy.exponential_delay(2).as_secs(), 4);
    }

    #[test]
    fn test_retries_stop_at_attempt_budget() {
        let policy = BackoffPolicy::default();
        let start = SystemTime::now();

        match policy.should_retry(start, 0) {
            RetryDecision::Retry { execute_after } => {
                let wait = execute_after.duration_since(start).unwrap();
                assert!(wait >= Duration::from_secs(1) && wait < Duration::from_secs(2));
            }
            RetryDecision::DoNotRetry => panic!("first retry should be allowed"),
        }
        assert!(matches!(
            policy.should_retry(start, 1),
            RetryDecision::Retry { .. }
        ));
        assert!(matches!(
            policy.should_retry(start, 2),
            RetryDecision::DoNotRetry
        ));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = BackoffPolicy::new(20);

        let delay = policy.exponential_delay(10);
        assert!(delay <= policy.max_delay);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = BackoffPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);
        assert!(matches!(
            policy.should_retry(SystemTime::now(), 0),
            RetryDecision::DoNotRetry
        ));
    }
}
