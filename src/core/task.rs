//! Task data model.
//!
//! Tasks are the atomic units of planned work. Each task tracks its status,
//! role, assigned executor model, dependencies, and terminal outputs.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task within a plan.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Logical actor category assigned to a task.
///
/// Roles describe what kind of work a task represents, not a real
/// process. Executors do the work; the reviewer validates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Orchestrator,
    Planner,
    Executor,
    Reviewer,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "orchestrator",
            AgentRole::Planner => "planner",
            AgentRole::Executor => "executor",
            AgentRole::Reviewer => "reviewer",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task status in its lifecycle.
///
/// `Pending -> InProgress -> {Completed | Failed}`, with `Cancelled`
/// reachable from `Pending` and `InProgress` via explicit cancellation.
/// No transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A single unit of planned work.
///
/// Tasks track status, role, the executor model chosen to run them,
/// dependencies on other tasks, timing, and terminal outputs. The
/// `user_*` flags support human-in-the-loop editing of a generated
/// plan before or during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Human-readable goal text.
    pub description: String,
    /// Logical actor category for this task.
    pub role: AgentRole,
    /// Executor model identifier. May be reassigned by a user before
    /// execution; resolved by the selection policy when absent.
    pub model: Option<String>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// IDs of tasks that must reach `Completed` before this one may run.
    pub dependencies: Vec<TaskId>,
    /// Result output after completion.
    pub result: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task started execution.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether a user edited this task after generation.
    pub user_edited: bool,
    /// Whether a user explicitly assigned the executor model.
    pub user_assigned_model: bool,
    /// Whether a user selected this task for subset execution.
    pub selected: bool,
}

impl Task {
    /// Create a new pending task with the given description and role.
    pub fn new(description: &str, role: AgentRole) -> Self {
        Self {
            id: TaskId::new(),
            description: description.to_string(),
            role,
            model: None,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            user_edited: false,
            user_assigned_model: false,
            selected: false,
        }
    }

    /// Add dependencies at construction time.
    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Start the task.
    ///
    /// Transitions `Pending -> InProgress` and records the start time.
    /// Dependency gating is enforced by the scheduler before this is
    /// called; any other source state is rejected.
    pub fn start(&mut self) -> Result<()> {
        if self.status != TaskStatus::Pending {
            return Err(self.invalid_transition(TaskStatus::InProgress));
        }
        self.status = TaskStatus::InProgress;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the task as successfully completed with a result.
    ///
    /// Allowed from `Pending` (graceful short-circuit paths) and
    /// `InProgress`; rejected from terminal states.
    pub fn complete(&mut self, result: &str) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition(TaskStatus::Completed));
        }
        self.status = TaskStatus::Completed;
        self.result = Some(result.to_string());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the task as failed with an error message.
    ///
    /// Allowed from `Pending` (unmet dependencies fail a task without it
    /// ever starting) and `InProgress`; rejected from terminal states.
    pub fn fail(&mut self, error: &str) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition(TaskStatus::Failed));
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.to_string());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Cancel the task.
    ///
    /// Allowed from `Pending` and `InProgress`; rejected from terminal
    /// states.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition(TaskStatus::Cancelled));
        }
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Assign an executor model on behalf of a user.
    pub fn assign_model(&mut self, model: &str) {
        self.model = Some(model.to_string());
        self.user_assigned_model = true;
    }

    /// Check if the task is in a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    fn invalid_transition(&self, to: TaskStatus) -> Error {
        Error::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
