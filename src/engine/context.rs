// ABOUTME: Per-task runtime state created at dispatch
// ABOUTME: Tracks the attempt counter and resolved policy for one execution

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::retry::RetryConfig;

/// Runtime state for a single task execution. Created once per task at
/// dispatch and never shared across tasks.
#[derive(Debug, Clone)]
pub struct TaskExecutionContext {
    pub task_id: String,
    pub workflow_id: String,
    pub start_time: DateTime<Utc>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    started: Instant,
}

impl TaskExecutionContext {
    pub fn new(task_id: impl Into<String>, workflow_id: impl Into<String>, config: &RetryConfig) -> Self {
        Self {
            task_id: task_id.into(),
            workflow_id: workflow_id.into(),
            start_time: Utc::now(),
            retry_count: 0,
            max_retries: config.max_retries,
            timeout: config.timeout,
            started: Instant::now(),
        }
    }

    pub fn retries_remaining(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub fn record_retry(&mut self) {
        self.retry_count += 1;
    }

    /// Wall time since the task's original start, spanning all attempts and
    /// backoff delays.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
