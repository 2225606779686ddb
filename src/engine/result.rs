// ABOUTME: Terminal outcome types for tasks and whole runs
// ABOUTME: Defines TaskResult, WorkflowResult, and the aggregate summary

use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::retry::RetryAttempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal outcome for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Wall time including all retries and backoff delays.
    pub duration: Duration,
    /// Retries actually performed: attempts made minus one.
    pub retry_count: u32,
    pub attempts: Vec<RetryAttempt>,
}

impl TaskResult {
    pub fn success(
        task_id: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        retry_count: u32,
        attempts: Vec<RetryAttempt>,
        data: Value,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            data: Some(data),
            error: None,
            start_time,
            end_time: Utc::now(),
            duration,
            retry_count,
            attempts,
        }
    }

    pub fn failure(
        task_id: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        retry_count: u32,
        attempts: Vec<RetryAttempt>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            data: None,
            error: Some(error.into()),
            start_time,
            end_time: Utc::now(),
            duration,
            retry_count,
            attempts,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Terminal outcome for a run. Contains a result for every task that was
/// dispatched; tasks never attempted (validation failed first) are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    /// True iff the error list is empty.
    pub success: bool,
    pub results: IndexMap<String, TaskResult>,
    /// Errors in the order they were encountered.
    pub errors: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub summary: WorkflowSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub total_tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
}

impl WorkflowResult {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: false,
            results: IndexMap::new(),
            errors: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            summary: WorkflowSummary::default(),
        }
    }

    pub fn insert_result(&mut self, result: TaskResult) {
        self.results.insert(result.task_id.clone(), result);
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn task_result(&self, task_id: &str) -> Option<&TaskResult> {
        self.results.get(task_id)
    }

    /// Seal the result: stamp the end time, compute overall success, and
    /// refresh the summary.
    pub fn finish(&mut self, duration: Duration) {
        self.end_time = Some(Utc::now());
        self.duration = Some(duration);
        self.success = self.errors.is_empty();
        self.update_summary();
    }

    fn update_summary(&mut self) {
        let total = self.results.len();
        let succeeded = self.results.values().filter(|r| r.is_successful()).count();
        let failed = total - succeeded;
        let success_rate = if total > 0 {
            (succeeded as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        self.summary = WorkflowSummary {
            total_tasks: total,
            succeeded,
            failed,
            success_rate,
        };
    }
}
