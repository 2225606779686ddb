// ABOUTME: Retry policy resolution, backoff delay computation, and error classification
// ABOUTME: Provides RetryConfig, per-attempt records, and the retryable-error check

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{ExecutionError, Result};
use crate::workflow::{BackoffStrategy, TaskDefinition};

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Error-message substrings that mark a failure as retryable by default.
/// Task definitions extend this set with their own patterns.
pub const DEFAULT_RETRYABLE_PATTERNS: [&str; 7] = [
    "timeout",
    "timed out",
    "network",
    "connection",
    "temporary",
    "rate limit",
    "server error",
];

/// Resolved, validated execution policy for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub timeout: Duration,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            timeout: crate::workflow::DEFAULT_TASK_TIMEOUT,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl RetryConfig {
    /// Resolve the policy for a task, filling unset values from system defaults.
    pub fn for_task(task: &TaskDefinition) -> Self {
        Self {
            max_retries: task.retries,
            timeout: task.timeout,
            strategy: task.backoff,
            ..Self::default()
        }
    }

    /// Reject configurations that could never execute sensibly. Runs before
    /// the first attempt; a failure here is an unretryable task failure.
    pub fn validate(&self, task_id: &str) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ExecutionError::InvalidRetryConfig {
                task_id: task_id.to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }
        if self.base_delay.is_zero() {
            return Err(ExecutionError::InvalidRetryConfig {
                task_id: task_id.to_string(),
                reason: "base delay must be positive".to_string(),
            });
        }
        if self.max_delay.is_zero() {
            return Err(ExecutionError::InvalidRetryConfig {
                task_id: task_id.to_string(),
                reason: "max delay must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Delay before the given retry attempt (1-based), capped at `max_delay`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base_ms = self.base_delay.as_millis() as f64;

        let delay_ms = match self.strategy {
            BackoffStrategy::Exponential => base_ms * 2f64.powi(attempt as i32 - 1),
            BackoffStrategy::Linear => base_ms * attempt as f64,
            BackoffStrategy::Jitter => {
                let exponential = base_ms * 2f64.powi(attempt as i32 - 1);
                exponential + exponential * rand::thread_rng().gen_range(0.0..0.1)
            }
        };

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

/// Case-insensitive substring match of an error message against the union of
/// the built-in patterns and a task's own list. Errors matching neither set
/// (validation failures, authorization failures) are not retried.
pub fn is_retryable(error: &str, custom_patterns: &[String]) -> bool {
    let message = error.to_lowercase();

    DEFAULT_RETRYABLE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
        || custom_patterns
            .iter()
            .any(|pattern| message.contains(&pattern.to_lowercase()))
}

/// One record per handler attempt, accumulated for the lifetime of a task's
/// execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
}

impl RetryAttempt {
    pub fn succeeded(duration: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            success: true,
            duration,
            error: None,
        }
    }

    pub fn failed(duration: Duration, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            success: false,
            duration,
            error: Some(error.into()),
        }
    }
}
