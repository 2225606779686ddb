// ABOUTME: Task definition module for the taskwave orchestration engine
// ABOUTME: Exposes task definitions, the handler trait, and the workflow builder

pub mod builder;
pub mod task;

pub use builder::WorkflowBuilder;
pub use task::{BackoffStrategy, TaskDefinition, TaskHandler, DEFAULT_TASK_TIMEOUT};
