// ABOUTME: Main library module for the taskwave orchestration engine
// ABOUTME: Exports the engine and task-definition modules and the public API

pub mod engine;
pub mod workflow;

// Re-export commonly used types
pub use engine::{
    ChannelSink, EventSink, NullSink, TaskResult, TaskStatus, TracingSink, WorkflowEngine,
    WorkflowEvent, WorkflowResult,
};
pub use workflow::{BackoffStrategy, TaskDefinition, TaskHandler, WorkflowBuilder};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
