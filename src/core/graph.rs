//! Dependency graph over a plan's tasks.
//!
//! `PlanGraph` represents task dependencies as a directed graph, used to
//! validate plans against cycles and unknown dependency ids at
//! construction time, and to compute the set of tasks ready to execute.

use crate::core::plan::Plan;
use crate::core::task::TaskId;
use crate::error::{Error, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Directed dependency graph for one plan.
///
/// Nodes are task ids; an edge `A -> B` means A must complete before B
/// can start. Built fresh from a plan snapshot; the graph itself holds
/// no task state beyond ids.
pub struct PlanGraph {
    graph: DiGraph<TaskId, ()>,
    node_index: HashMap<TaskId, NodeIndex>,
}

impl PlanGraph {
    /// Build the dependency graph for a plan.
    ///
    /// # Errors
    /// Returns a validation error if a task depends on an id not present
    /// in the plan, or if the dependencies form a cycle.
    pub fn from_plan(plan: &Plan) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_index = HashMap::new();

        for task in &plan.tasks {
            let index = graph.add_node(task.id);
            node_index.insert(task.id, index);
        }

        for task in &plan.tasks {
            let to = node_index[&task.id];
            for dep in &task.dependencies {
                let from = *node_index.get(dep).ok_or_else(|| {
                    Error::Validation(format!(
                        "Task {} depends on unknown task {}",
                        task.id.short(),
                        dep.short()
                    ))
                })?;
                graph.add_edge(from, to, ());
            }
        }

        if is_cyclic_directed(&graph) {
            return Err(Error::Validation(
                "Task dependencies contain a cycle".to_string(),
            ));
        }

        Ok(Self { graph, node_index })
    }

    /// Number of tasks in the graph.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges in the graph.
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get the ids whose dependencies are all in the completed set.
    ///
    /// Completed tasks themselves are excluded. The scheduler further
    /// filters this by task status, so a running or failed task never
    /// re-enters the executable set.
    pub fn ready_ids(&self, completed: &HashSet<TaskId>) -> Vec<TaskId> {
        self.graph
            .node_indices()
            .filter_map(|index| {
                let id = self.graph[index];
                if completed.contains(&id) {
                    return None;
                }
                let deps_satisfied = self
                    .graph
                    .neighbors_directed(index, petgraph::Direction::Incoming)
                    .all(|dep| completed.contains(&self.graph[dep]));
                deps_satisfied.then_some(id)
            })
            .collect()
    }

    /// Get the direct dependencies of a task.
    pub fn dependencies_of(&self, id: &TaskId) -> Vec<TaskId> {
        match self.node_index.get(id) {
            Some(&index) => self
                .graph
                .neighbors_directed(index, petgraph::Direction::Incoming)
                .map(|dep| self.graph[dep])
                .collect(),
            None => Vec::new(),
        }
    }
}
