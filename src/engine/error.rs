// ABOUTME: Error types for task validation and execution
// ABOUTME: Defines structural validation errors and engine execution errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Duplicate task IDs: {ids:?}")]
    DuplicateTaskIds { ids: Vec<String> },

    #[error("Task '{task}' depends on non-existent task '{dependency}'")]
    MissingDependency { task: String, dependency: String },

    #[error("Circular dependency detected involving task '{task}'")]
    CircularDependency { task: String },

    #[error("Task id must not be empty")]
    EmptyTaskId,

    #[error("Invalid configuration for task '{task}': {reason}")]
    InvalidTaskField { task: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Invalid retry configuration for task '{task_id}': {reason}")]
    InvalidRetryConfig { task_id: String, reason: String },

    #[error("Task '{task_id}' timed out after {timeout_ms}ms")]
    Timeout { task_id: String, timeout_ms: u128 },

    #[error("Task '{task_id}' handler panicked: {message}")]
    HandlerPanic { task_id: String, message: String },

    #[error("Deadlock detected: tasks {tasks:?} can never become ready")]
    Deadlock { tasks: Vec<String> },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
