// ABOUTME: Explicit registry mapping (id, handler, options) into task definitions
// ABOUTME: Decouples the engine from however callers produce their tasks

use super::task::{TaskDefinition, TaskHandler};

/// Collects task definitions for a single run.
///
/// The builder performs no validation of its own; duplicate ids and bad
/// dependency references are reported by the engine's validator so that
/// every structural problem surfaces in one place.
#[derive(Default)]
pub struct WorkflowBuilder {
    tasks: Vec<TaskDefinition>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully configured task definition.
    pub fn task(mut self, task: TaskDefinition) -> Self {
        self.tasks.push(task);
        self
    }

    /// Shorthand for a dependency-free task with default policy.
    pub fn handler(self, id: impl Into<String>, handler: impl TaskHandler + 'static) -> Self {
        self.task(TaskDefinition::new(id, handler))
    }

    pub fn add_task(&mut self, task: TaskDefinition) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn build(self) -> Vec<TaskDefinition> {
        self.tasks
    }
}
