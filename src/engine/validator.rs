// ABOUTME: Structural validation, cycle detection, and dependency graph queries
// ABOUTME: Every check runs before any task executes; all checks are pure

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};

use super::error::ValidationError;
use crate::workflow::TaskDefinition;

/// Dependency graph over a task list. Edges run dependency -> dependent.
pub struct TaskGraph {
    graph: Graph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    /// Build the graph, failing on duplicate ids or unknown dependencies.
    pub fn from_tasks(tasks: &[TaskDefinition]) -> Result<Self, ValidationError> {
        let mut graph = Graph::new();
        let mut indices = HashMap::new();

        for task in tasks {
            if indices.contains_key(&task.id) {
                return Err(ValidationError::DuplicateTaskIds {
                    ids: vec![task.id.clone()],
                });
            }
            let node = graph.add_node(task.id.clone());
            indices.insert(task.id.clone(), node);
        }

        for task in tasks {
            let task_node = indices[&task.id];
            for dependency in &task.dependencies {
                match indices.get(dependency) {
                    Some(&dependency_node) => {
                        graph.add_edge(dependency_node, task_node, ());
                    }
                    None => {
                        return Err(ValidationError::MissingDependency {
                            task: task.id.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { graph, indices })
    }

    /// Reject any cycle, reporting the task where detection occurred.
    /// A self-dependency is a one-node cycle and fails the same way.
    pub fn ensure_acyclic(&self) -> Result<(), ValidationError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(ValidationError::CircularDependency {
                task: self.graph[cycle.node_id()].clone(),
            }),
        }
    }

    /// Full topological order over the task ids. Diagnostics only; the
    /// scheduler recomputes readiness dynamically for maximal parallelism
    /// instead of following a fixed linear order.
    pub fn execution_order(&self) -> Result<Vec<String>, ValidationError> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            ValidationError::CircularDependency {
                task: self.graph[cycle.node_id()].clone(),
            }
        })?;

        Ok(sorted
            .into_iter()
            .map(|node| self.graph[node].clone())
            .collect())
    }

    /// Closure of a task's dependencies, direct and transitive. Visited
    /// tracking makes the traversal safe even on cyclic input.
    pub fn transitive_dependencies(&self, task_id: &str) -> Vec<String> {
        let Some(&start) = self.indices.get(task_id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut closure = Vec::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for dependency in self.graph.neighbors_directed(node, Direction::Incoming) {
                if visited.insert(dependency) {
                    closure.push(self.graph[dependency].clone());
                    queue.push_back(dependency);
                }
            }
        }

        closure
    }

    pub fn direct_dependencies(&self, task_id: &str) -> Vec<String> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Tasks that directly depend on the given task.
    pub fn dependents(&self, task_id: &str) -> Vec<String> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    fn neighbors(&self, task_id: &str, direction: Direction) -> Vec<String> {
        match self.indices.get(task_id) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, direction)
                .map(|neighbor| self.graph[neighbor].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn task_count(&self) -> usize {
        self.indices.len()
    }
}

/// Structural checks for a single task definition.
pub fn validate_task(task: &TaskDefinition) -> Result<(), ValidationError> {
    if task.id.is_empty() {
        return Err(ValidationError::EmptyTaskId);
    }
    if task.timeout.is_zero() {
        return Err(ValidationError::InvalidTaskField {
            task: task.id.clone(),
            reason: "timeout must be positive".to_string(),
        });
    }
    for dependency in &task.dependencies {
        if dependency.is_empty() {
            return Err(ValidationError::InvalidTaskField {
                task: task.id.clone(),
                reason: "dependency ids must not be empty".to_string(),
            });
        }
        if dependency == &task.id {
            // Degenerate one-node cycle.
            return Err(ValidationError::CircularDependency {
                task: task.id.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a full task list: per-task structure, id uniqueness, referential
/// integrity, and acyclicity. Runs before any task executes and is
/// idempotent - the same list always yields the same verdict.
pub fn validate_tasks(tasks: &[TaskDefinition]) -> Result<(), ValidationError> {
    for task in tasks {
        validate_task(task)?;
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for task in tasks {
        if !seen.insert(task.id.as_str()) && !duplicates.contains(&task.id) {
            duplicates.push(task.id.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(ValidationError::DuplicateTaskIds { ids: duplicates });
    }

    let graph = TaskGraph::from_tasks(tasks)?;
    graph.ensure_acyclic()
}

/// Convenience wrapper building the graph for a one-off ordering query.
pub fn execution_order(tasks: &[TaskDefinition]) -> Result<Vec<String>, ValidationError> {
    TaskGraph::from_tasks(tasks)?.execution_order()
}

/// Convenience wrapper for a one-off dependency-closure query.
pub fn transitive_dependencies(
    task_id: &str,
    tasks: &[TaskDefinition],
) -> Result<Vec<String>, ValidationError> {
    Ok(TaskGraph::from_tasks(tasks)?.transitive_dependencies(task_id))
}
