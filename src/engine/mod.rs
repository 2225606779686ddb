// ABOUTME: Task execution engine module for the taskwave orchestrator
// ABOUTME: Handles validation, state tracking, retry execution, and scheduling

pub mod context;
pub mod error;
pub mod events;
pub mod executor;
pub mod result;
pub mod retry;
pub mod scheduler;
pub mod state;
pub mod validator;

pub use context::TaskExecutionContext;
pub use error::{ExecutionError, Result, ValidationError};
pub use events::{ChannelSink, EventSink, NullSink, TracingSink, WorkflowEvent};
pub use executor::TaskRunner;
pub use result::{TaskResult, TaskStatus, WorkflowResult, WorkflowSummary};
pub use retry::{is_retryable, RetryAttempt, RetryConfig};
pub use scheduler::WorkflowEngine;
pub use state::StateTracker;
pub use validator::{
    execution_order, transitive_dependencies, validate_task, validate_tasks, TaskGraph,
};
