// ABOUTME: Executes a single task to a terminal outcome
// ABOUTME: Races each attempt against its deadline and drives the retry loop

use std::sync::Arc;

use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::context::TaskExecutionContext;
use super::error::ExecutionError;
use super::events::{EventSink, WorkflowEvent};
use super::result::TaskResult;
use super::retry::{is_retryable, RetryAttempt, RetryConfig};
use crate::workflow::TaskDefinition;

/// Runs tasks for one workflow execution, emitting task-level lifecycle
/// events as outcomes are reached.
pub struct TaskRunner {
    workflow_id: String,
    events: Arc<dyn EventSink>,
}

impl TaskRunner {
    pub fn new(workflow_id: impl Into<String>, events: Arc<dyn EventSink>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            events,
        }
    }

    /// Execute one task until success or exhausted retries. Timeouts are
    /// ordinary failures subject to the same retryable classification as any
    /// other error.
    pub async fn run_task(&self, task: &TaskDefinition) -> TaskResult {
        let config = RetryConfig::for_task(task);
        let mut context = TaskExecutionContext::new(&task.id, &self.workflow_id, &config);

        if let Err(config_error) = config.validate(&task.id) {
            warn!(task_id = %task.id, %config_error, "rejecting task with invalid retry config");
            let result = TaskResult::failure(
                &task.id,
                context.start_time,
                context.elapsed(),
                0,
                Vec::new(),
                config_error.to_string(),
            );
            self.emit_failed(&result);
            return result;
        }

        let mut attempts: Vec<RetryAttempt> = Vec::new();

        loop {
            let attempt_started = tokio::time::Instant::now();
            match self.attempt(task, &config).await {
                Ok(data) => {
                    attempts.push(RetryAttempt::succeeded(attempt_started.elapsed()));
                    let duration = context.elapsed();
                    info!(
                        task_id = %task.id,
                        ?duration,
                        retry_count = context.retry_count,
                        "task completed"
                    );
                    self.events.emit(&WorkflowEvent::TaskCompleted {
                        task_id: task.id.clone(),
                        duration,
                        data: Some(data.clone()),
                    });
                    return TaskResult::success(
                        &task.id,
                        context.start_time,
                        duration,
                        context.retry_count,
                        attempts,
                        data,
                    );
                }
                Err(message) => {
                    attempts.push(RetryAttempt::failed(attempt_started.elapsed(), message.clone()));

                    if context.retries_remaining() && is_retryable(&message, &task.retryable_errors)
                    {
                        context.record_retry();
                        warn!(
                            task_id = %task.id,
                            retry = context.retry_count,
                            max_retries = context.max_retries,
                            %message,
                            "task attempt failed, retrying"
                        );
                        self.events.emit(&WorkflowEvent::TaskRetry {
                            task_id: task.id.clone(),
                            workflow_id: self.workflow_id.clone(),
                            retry_count: context.retry_count,
                            error: message.clone(),
                        });

                        let delay = config.calculate_delay(context.retry_count);
                        debug!(task_id = %task.id, ?delay, "backing off before retry");
                        sleep(delay).await;
                        continue;
                    }

                    error!(
                        task_id = %task.id,
                        attempts = attempts.len(),
                        %message,
                        "task failed"
                    );
                    let result = TaskResult::failure(
                        &task.id,
                        context.start_time,
                        context.elapsed(),
                        context.retry_count,
                        attempts,
                        message,
                    );
                    self.emit_failed(&result);
                    return result;
                }
            }
        }
    }

    /// One handler invocation raced against the per-attempt deadline.
    ///
    /// The handler runs on a spawned task so a lost race leaves it running
    /// detached: the engine stops waiting, discards its eventual result, and
    /// makes no attempt to undo its side effects.
    async fn attempt(
        &self,
        task: &TaskDefinition,
        config: &RetryConfig,
    ) -> Result<Value, String> {
        let handler = Arc::clone(&task.handler);
        let invocation = tokio::spawn(async move { handler.run().await });

        match timeout(config.timeout, invocation).await {
            Ok(Ok(Ok(data))) => Ok(data),
            Ok(Ok(Err(handler_error))) => Err(format!("{handler_error:#}")),
            Ok(Err(join_error)) => Err(ExecutionError::HandlerPanic {
                task_id: task.id.clone(),
                message: join_error.to_string(),
            }
            .to_string()),
            Err(_elapsed) => Err(ExecutionError::Timeout {
                task_id: task.id.clone(),
                timeout_ms: config.timeout.as_millis(),
            }
            .to_string()),
        }
    }

    fn emit_failed(&self, result: &TaskResult) {
        self.events.emit(&WorkflowEvent::TaskFailed {
            task_id: result.task_id.clone(),
            workflow_id: self.workflow_id.clone(),
            error: result.error.clone().unwrap_or_default(),
            retry_count: result.retry_count,
        });
    }
}
