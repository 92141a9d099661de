//! Redelivery and dead-letter policy for queue consumers.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Suffix appended to a queue name to form its default dead-letter queue.
pub const DEFAULT_DEAD_LETTER_SUFFIX: &str = "-poison";

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;
const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How a consumer treats messages whose processing failed transiently.
///
/// A failed delivery is retried with exponential backoff until it has been
/// delivered `max_attempts` times; after that it is moved to the dead-letter
/// queue and removed from the source queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RetryPolicy {
    /// Deliveries allowed before a message is dead-lettered (at least 1).
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-max-attempts", env = "RETRY_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)
    )]
    pub max_attempts: u32,

    /// Delay before the first redelivery, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-initial-backoff-ms", env = "RETRY_INITIAL_BACKOFF_MS", default_value_t = DEFAULT_INITIAL_BACKOFF_MS)
    )]
    pub initial_backoff_ms: u64,

    /// Upper bound of the redelivery delay, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-max-backoff-ms", env = "RETRY_MAX_BACKOFF_MS", default_value_t = DEFAULT_MAX_BACKOFF_MS)
    )]
    pub max_backoff_ms: u64,

    /// Factor applied to the delay after each failed delivery.
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-backoff-multiplier", env = "RETRY_BACKOFF_MULTIPLIER", default_value_t = DEFAULT_BACKOFF_MULTIPLIER)
    )]
    pub backoff_multiplier: f64,

    /// Dead-letter queue name. Defaults to `<queue>-poison`.
    #[cfg_attr(
        feature = "config",
        arg(long = "retry-dead-letter-queue", env = "RETRY_DEAD_LETTER_QUEUE")
    )]
    pub dead_letter_queue: Option<String>,
}

/// What to do with a message after a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Redeliver after the given delay.
    Retry(Duration),
    /// Attempts are exhausted; move to the dead-letter queue.
    DeadLetter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            dead_letter_queue: None,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy with the given attempt budget and initial backoff.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: initial_backoff.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Create a policy that dead-letters on the first failure.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 1.0,
            dead_letter_queue: None,
        }
    }

    /// Set the maximum backoff.
    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff_ms = max_backoff.as_millis() as u64;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set an explicit dead-letter queue.
    #[must_use]
    pub fn with_dead_letter_queue(mut self, queue: impl Into<String>) -> Self {
        self.dead_letter_queue = Some(queue.into());
        self
    }

    /// Returns the dead-letter queue for messages from `queue`.
    pub fn dead_letter_queue_for(&self, queue: &str) -> String {
        self.dead_letter_queue
            .clone()
            .unwrap_or_else(|| format!("{queue}{DEFAULT_DEAD_LETTER_SUFFIX}"))
    }

    /// Delay before redelivering a message whose `attempt`-th delivery failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let millis = (self.initial_backoff_ms as f64) * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Decides the fate of a message whose `attempt`-th delivery failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts.max(1) {
            RetryDecision::DeadLetter
        } else {
            RetryDecision::Retry(self.backoff(attempt))
        }
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("Retry max attempts must be at least 1".to_string());
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(format!(
                "Retry backoff multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err("Retry initial backoff cannot exceed the maximum backoff".to_string());
        }
        if let Some(queue) = &self.dead_letter_queue
            && queue.trim().is_empty()
        {
            return Err("Dead-letter queue name cannot be blank".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));

        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_max_backoff() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100))
            .with_max_backoff(Duration::from_millis(300));

        assert_eq!(policy.backoff(3), Duration::from_millis(300));
        assert_eq!(policy.backoff(9), Duration::from_millis(300));
    }

    #[test]
    fn test_decide_retries_until_budget_is_spent() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        assert_eq!(policy.decide(1), RetryDecision::Retry(Duration::from_millis(10)));
        assert_eq!(policy.decide(2), RetryDecision::Retry(Duration::from_millis(20)));
        assert_eq!(policy.decide(3), RetryDecision::DeadLetter);
        assert_eq!(policy.decide(4), RetryDecision::DeadLetter);
    }

    #[test]
    fn test_no_retry() {
        assert_eq!(RetryPolicy::no_retry().decide(1), RetryDecision::DeadLetter);
    }

    #[test]
    fn test_dead_letter_queue_name() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.dead_letter_queue_for("cartqueue"), "cartqueue-poison");

        let policy = policy.with_dead_letter_queue("cart-dlq");
        assert_eq!(policy.dead_letter_queue_for("cartqueue"), "cart-dlq");
    }

    #[test]
    fn test_validation() {
        let mut policy = RetryPolicy::default();
        policy.max_attempts = 0;
        assert!(policy.validate().is_err());

        let policy = RetryPolicy::default().with_multiplier(0.5);
        assert!(policy.validate().is_err());

        let policy = RetryPolicy::default().with_dead_letter_queue("  ");
        assert!(policy.validate().is_err());
    }
}
