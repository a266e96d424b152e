//! Exponential backoff policy shared by per-query retries and the outer
//! research workflow.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default total number of attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Default cap on any single backoff delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 32_000;

/// Default backoff multiplier (2.0 doubles the delay on every retry).
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Retry policy with exponential backoff and optional jitter.
///
/// `max_attempts` counts every call, so the default of 3 means one try and
/// two retries, sleeping 1s then 2s in between.
///
/// # Examples
///
/// ```
/// use wtt_search::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth).
    pub max_delay_ms: u64,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// Random extra delay as a fraction of the computed delay (0.0 disables).
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_ratio: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay in milliseconds.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Set the jitter ratio.
    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }

    /// Effective attempt budget (never below one).
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to sleep before retry number `retry` (1-based).
    ///
    /// Formula: `min(base * multiplier^(retry - 1), max_delay) + jitter`.
    /// Retry 0 means "no retry yet" and yields a zero delay.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base = self.base_delay_ms as f64;
        let max = self.max_delay_ms as f64;
        let exp = self.backoff_multiplier.max(1.0).powi(retry as i32 - 1);
        let delay = (base * exp).min(max);

        let jitter = if self.jitter_ratio > 0.0 {
            delay * rand::random::<f64>() * self.jitter_ratio
        } else {
            0.0
        };

        Duration::from_millis((delay + jitter) as u64)
    }

    /// Validates the policy.
    pub fn validate(&self) -> Result<(), String> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be >= 1.0".into());
        }
        if !self.jitter_ratio.is_finite() || self.jitter_ratio < 0.0 {
            return Err("jitter_ratio must be >= 0.0".into());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err("base_delay_ms must be <= max_delay_ms".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.base_delay_ms, DEFAULT_BASE_DELAY_MS);
        assert_eq!(policy.max_delay_ms, DEFAULT_MAX_DELAY_MS);
        assert!(policy.jitter_ratio.abs() < f64::EPSILON);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let policy = RetryPolicy::new()
            .with_max_attempts(5)
            .with_base_delay_ms(500)
            .with_max_delay_ms(16_000)
            .with_backoff_multiplier(1.5)
            .with_jitter_ratio(0.1);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay_ms, 500);
        assert_eq!(policy.max_delay_ms, 16_000);
        assert!((policy.backoff_multiplier - 1.5).abs() < f64::EPSILON);
        assert!((policy.jitter_ratio - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_retry_has_no_delay() {
        assert_eq!(RetryPolicy::new().delay_for_retry(0), Duration::ZERO);
    }

    #[test]
    fn delays_double_from_one_second() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(4000));
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = RetryPolicy::new().with_max_delay_ms(3000);
        // Uncapped: 1000 * 2^4 = 16000ms.
        assert_eq!(policy.delay_for_retry(5), Duration::from_millis(3000));
    }

    #[test]
    fn jitter_stays_within_ratio() {
        let policy = RetryPolicy::new().with_jitter_ratio(0.1);
        for _ in 0..50 {
            let delay = policy.delay_for_retry(1).as_millis();
            assert!((1000..=1100).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn zero_attempts_treated_as_one() {
        assert_eq!(RetryPolicy::new().with_max_attempts(0).attempts(), 1);
    }

    #[test]
    fn invalid_multiplier_rejected() {
        let policy = RetryPolicy::new().with_backoff_multiplier(0.5);
        assert!(policy.validate().unwrap_err().contains("backoff_multiplier"));
    }

    #[test]
    fn deserializes_partial_toml_like_json() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 5}"#).expect("deserialize");
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay_ms, DEFAULT_BASE_DELAY_MS);
    }
}
