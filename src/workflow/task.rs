// ABOUTME: Task definition types and the handler trait for units of work
// ABOUTME: Defines TaskDefinition, TaskHandler, and backoff strategy selection

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default per-attempt deadline for a task.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_millis(2_000);

/// A unit of asynchronous work. Implementations produce a JSON value on
/// success and an error describing the failure otherwise.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self) -> anyhow::Result<Value>;
}

// Plain async closures register directly as handlers.
#[async_trait]
impl<F, Fut> TaskHandler for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn run(&self) -> anyhow::Result<Value> {
        (self)().await
    }
}

/// Strategy mapping a retry attempt number to the delay before that attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Exponential,
    Linear,
    Jitter,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential
    }
}

/// A named task with declared dependencies and retry/timeout policy.
///
/// Definitions are immutable once a run starts; the engine takes ownership
/// of the task list for the duration of the run.
#[derive(Clone)]
pub struct TaskDefinition {
    pub id: String,
    pub handler: Arc<dyn TaskHandler>,
    pub dependencies: Vec<String>,
    /// Maximum number of retries after the first attempt.
    pub retries: u32,
    /// Per-attempt deadline.
    pub timeout: Duration,
    pub backoff: BackoffStrategy,
    /// Error-message substrings that mark a failure as retryable, merged
    /// with the built-in set.
    pub retryable_errors: Vec<String>,
    pub description: Option<String>,
}

impl TaskDefinition {
    pub fn new(id: impl Into<String>, handler: impl TaskHandler + 'static) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
            dependencies: Vec::new(),
            retries: 0,
            timeout: DEFAULT_TASK_TIMEOUT,
            backoff: BackoffStrategy::default(),
            retryable_errors: Vec::new(),
            description: None,
        }
    }

    /// Declare tasks that must reach a terminal state before this one starts.
    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_retryable_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_errors = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .field("retryable_errors", &self.retryable_errors)
            .finish_non_exhaustive()
    }
}
