//! Plan data model.
//!
//! A plan is a batch of tasks derived from a single user request. Task
//! order is creation order, not execution order; execution order is
//! decided by the scheduler from task dependencies.

use crate::core::task::{Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Create a new unique plan identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plan status in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Planning,
    Ready,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanStatus::Planning => write!(f, "planning"),
            PlanStatus::Ready => write!(f, "ready"),
            PlanStatus::Executing => write!(f, "executing"),
            PlanStatus::Completed => write!(f, "completed"),
            PlanStatus::Failed => write!(f, "failed"),
            PlanStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Per-status task counts for a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl std::fmt::Display for PlanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} completed ({} failed, {} cancelled)",
            self.completed, self.total, self.failed, self.cancelled
        )
    }
}

/// A batch of tasks derived from one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// The request text this plan was generated from.
    pub original_request: String,
    /// Tasks in creation order.
    pub tasks: Vec<Task>,
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: PlanStatus,
}

impl Plan {
    /// Create a new plan over the given tasks, in `Ready` status.
    pub fn new(original_request: &str, tasks: Vec<Task>) -> Self {
        Self {
            id: PlanId::new(),
            original_request: original_request.to_string(),
            tasks,
            created_at: Utc::now(),
            status: PlanStatus::Ready,
        }
    }

    /// Get a task by its ID.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    /// Get a mutable task by its ID.
    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == *id)
    }

    /// Check if every dependency of the given task has completed.
    pub fn dependencies_met(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|dep| {
            self.task(dep)
                .map(|t| t.status == TaskStatus::Completed)
                .unwrap_or(false)
        })
    }

    /// Check if some dependency of the given task is settled without
    /// completing (failed or cancelled), so the task can never run.
    pub fn dependencies_unsatisfiable(&self, task: &Task) -> bool {
        task.dependencies.iter().any(|dep| match self.task(dep) {
            Some(t) => t.status.is_terminal() && t.status != TaskStatus::Completed,
            // An unknown dependency id can never complete.
            None => true,
        })
    }

    /// Check if every task has reached a terminal state.
    pub fn all_settled(&self) -> bool {
        self.tasks.iter().all(|t| t.is_finished())
    }

    /// Count tasks per status.
    pub fn stats(&self) -> PlanStats {
        let mut stats = PlanStats {
            total: self.tasks.len(),
            ..Default::default()
        };
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// Summaries of completed tasks, for downstream task prompts.
    pub fn completed_summaries(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .filter_map(|t| {
                t.result
                    .as_ref()
                    .map(|r| format!("[{}] {}: {}", t.id.short(), t.description, r))
            })
            .collect()
    }
}
