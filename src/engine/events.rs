// ABOUTME: Lifecycle events and the injected observer seam
// ABOUTME: Provides the EventSink trait plus no-op, tracing, and channel sinks

use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::result::TaskResult;

/// Lifecycle events emitted during a run. Delivery is synchronous and
/// best-effort local dispatch; sinks must not block.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowEvent {
    WorkflowStarted {
        workflow_id: String,
        task_count: usize,
    },
    WorkflowCompleted {
        workflow_id: String,
        duration: Duration,
        results: IndexMap<String, TaskResult>,
    },
    WorkflowFailed {
        workflow_id: String,
        duration: Duration,
        errors: Vec<String>,
    },
    TaskStarted {
        task_id: String,
    },
    TaskCompleted {
        task_id: String,
        duration: Duration,
        data: Option<Value>,
    },
    TaskFailed {
        task_id: String,
        workflow_id: String,
        error: String,
        retry_count: u32,
    },
    TaskRetry {
        task_id: String,
        workflow_id: String,
        retry_count: u32,
        error: String,
    },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::WorkflowStarted { .. } => "WORKFLOW_STARTED",
            WorkflowEvent::WorkflowCompleted { .. } => "WORKFLOW_COMPLETED",
            WorkflowEvent::WorkflowFailed { .. } => "WORKFLOW_FAILED",
            WorkflowEvent::TaskStarted { .. } => "TASK_STARTED",
            WorkflowEvent::TaskCompleted { .. } => "TASK_COMPLETED",
            WorkflowEvent::TaskFailed { .. } => "TASK_FAILED",
            WorkflowEvent::TaskRetry { .. } => "TASK_RETRY",
        }
    }
}

/// Observer seam for lifecycle events. Passed into the engine explicitly so
/// it carries no implicit global dependency and delivery is testable.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &WorkflowEvent);
}

/// Discards every event. The engine's default.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &WorkflowEvent) {}
}

/// Logs each event through `tracing` at a severity matching its meaning.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::WorkflowStarted {
                workflow_id,
                task_count,
            } => info!(%workflow_id, task_count, "workflow started"),
            WorkflowEvent::WorkflowCompleted {
                workflow_id,
                duration,
                results,
            } => info!(%workflow_id, ?duration, tasks = results.len(), "workflow completed"),
            WorkflowEvent::WorkflowFailed {
                workflow_id,
                duration,
                errors,
            } => error!(%workflow_id, ?duration, error_count = errors.len(), "workflow failed"),
            WorkflowEvent::TaskStarted { task_id } => info!(%task_id, "task started"),
            WorkflowEvent::TaskCompleted {
                task_id, duration, ..
            } => info!(%task_id, ?duration, "task completed"),
            WorkflowEvent::TaskFailed {
                task_id,
                error,
                retry_count,
                ..
            } => error!(%task_id, retry_count, %error, "task failed"),
            WorkflowEvent::TaskRetry {
                task_id,
                retry_count,
                error,
                ..
            } => warn!(%task_id, retry_count, %error, "task retrying"),
        }
    }
}

/// Forwards events over an unbounded channel. A closed receiver is ignored;
/// delivery stays best-effort.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<WorkflowEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &WorkflowEvent) {
        let _ = self.sender.send(event.clone());
    }
}
