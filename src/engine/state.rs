// ABOUTME: Run-scoped task state tracking and readiness computation
// ABOUTME: Maintains completed and in-progress sets that drive wave scheduling

use std::collections::HashSet;

use crate::workflow::TaskDefinition;

/// Tracks which tasks have completed and which are in flight during one run.
///
/// `completed` covers both success and failure; a failed task still unblocks
/// its dependents. The two sets stay disjoint: `mark_completed` removes the
/// id from `in_progress` as it records completion. State is discarded with
/// the run.
#[derive(Debug, Default)]
pub struct StateTracker {
    completed: HashSet<String>,
    in_progress: HashSet<String>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_in_progress(&mut self, task_id: &str) {
        self.in_progress.insert(task_id.to_string());
    }

    /// Record a terminal outcome. Called at most once per task per run.
    pub fn mark_completed(&mut self, task_id: &str) {
        self.in_progress.remove(task_id);
        self.completed.insert(task_id.to_string());
    }

    /// A task is ready when it has not started and every dependency has
    /// reached a terminal state.
    pub fn is_ready(&self, task: &TaskDefinition) -> bool {
        if self.completed.contains(&task.id) || self.in_progress.contains(&task.id) {
            return false;
        }
        task.dependencies
            .iter()
            .all(|dependency| self.completed.contains(dependency))
    }

    /// Tasks currently ready to dispatch, in definition order.
    pub fn pending<'a>(&self, tasks: &'a [TaskDefinition]) -> Vec<&'a TaskDefinition> {
        tasks.iter().filter(|task| self.is_ready(task)).collect()
    }

    /// Tasks that have not yet reached a terminal state.
    pub fn remaining<'a>(&self, tasks: &'a [TaskDefinition]) -> Vec<&'a TaskDefinition> {
        tasks
            .iter()
            .filter(|task| !self.completed.contains(&task.id))
            .collect()
    }

    pub fn is_all_completed(&self, total: usize) -> bool {
        self.completed.len() == total
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn in_progress_count(&self) -> usize {
        self.in_progress.len()
    }
}
