// ABOUTME: Wave-based scheduling engine for dependency-ordered task execution
// ABOUTME: Validates, fans out ready tasks concurrently, and aggregates results

use std::sync::Arc;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::error::ExecutionError;
use super::events::{EventSink, NullSink, WorkflowEvent};
use super::executor::TaskRunner;
use super::result::WorkflowResult;
use super::state::StateTracker;
use super::validator;
use crate::workflow::TaskDefinition;

/// Orchestrates one run at a time. Holds no state between runs; everything a
/// run produces lives in its `WorkflowResult`.
pub struct WorkflowEngine {
    events: Arc<dyn EventSink>,
}

impl WorkflowEngine {
    pub fn new() -> Self {
        Self {
            events: Arc::new(NullSink),
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Execute a task list to completion. Task-level failures never surface
    /// as an engine error; they land in the result's error list. Only
    /// pre-execution validation (or the defensive deadlock check) aborts a
    /// run, and both are reported through the returned `WorkflowResult`.
    pub async fn run(&self, tasks: Vec<TaskDefinition>) -> WorkflowResult {
        let workflow_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        info!(%workflow_id, task_count = tasks.len(), "starting workflow run");
        self.events.emit(&WorkflowEvent::WorkflowStarted {
            workflow_id: workflow_id.clone(),
            task_count: tasks.len(),
        });

        let mut result = WorkflowResult::new(workflow_id.clone());

        if let Err(validation_error) = validator::validate_tasks(&tasks) {
            error!(%workflow_id, %validation_error, "workflow rejected by validation");
            result.record_error(validation_error.to_string());
            result.finish(started.elapsed());
            self.emit_terminal(&result);
            return result;
        }

        let mut tracker = StateTracker::new();
        let runner = TaskRunner::new(workflow_id.clone(), Arc::clone(&self.events));
        let total = tasks.len();

        while !tracker.is_all_completed(total) {
            let wave = tracker.pending(&tasks);

            if wave.is_empty() {
                // Unreachable when validation holds; checked defensively.
                let stuck: Vec<String> = tracker
                    .remaining(&tasks)
                    .iter()
                    .map(|task| task.id.clone())
                    .collect();
                let deadlock = ExecutionError::Deadlock { tasks: stuck };
                error!(%workflow_id, %deadlock, "aborting run");
                result.record_error(deadlock.to_string());
                break;
            }

            let wave_ids: Vec<String> = wave.iter().map(|task| task.id.clone()).collect();
            debug!(%workflow_id, wave_size = wave_ids.len(), tasks = ?wave_ids, "dispatching wave");

            for task_id in &wave_ids {
                tracker.mark_in_progress(task_id);
                self.events.emit(&WorkflowEvent::TaskStarted {
                    task_id: task_id.clone(),
                });
            }

            // The whole wave settles before the next ready set is computed,
            // so a task never starts before all of its dependencies have a
            // terminal result.
            let wave_results =
                join_all(wave.iter().copied().map(|task| runner.run_task(task))).await;

            for task_result in wave_results {
                tracker.mark_completed(&task_result.task_id);
                if let Some(task_error) = &task_result.error {
                    result.record_error(format!("Task '{}': {}", task_result.task_id, task_error));
                }
                result.insert_result(task_result);
            }
        }

        result.finish(started.elapsed());
        info!(
            %workflow_id,
            success = result.success,
            tasks = result.results.len(),
            errors = result.errors.len(),
            duration = ?result.duration,
            "workflow run finished"
        );
        self.emit_terminal(&result);
        result
    }

    fn emit_terminal(&self, result: &WorkflowResult) {
        let duration = result.duration.unwrap_or_default();
        if result.success {
            self.events.emit(&WorkflowEvent::WorkflowCompleted {
                workflow_id: result.workflow_id.clone(),
                duration,
                results: result.results.clone(),
            });
        } else {
            self.events.emit(&WorkflowEvent::WorkflowFailed {
                workflow_id: result.workflow_id.clone(),
                duration,
                errors: result.errors.clone(),
            });
        }
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}
