//! Per-session aggregate state.
//!
//! A `SessionContext` holds the active plan, the append-only audit log of
//! agent messages, and the workspace side effects accumulated across all
//! tasks in the session. One context exists per session id, created
//! lazily on first use and kept for the lifetime of the session.

use crate::core::plan::Plan;
use crate::core::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque session identifier, supplied by the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An entry in the session audit log.
///
/// Messages are write-once and append-only; they are an audit trail,
/// never reprocessed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Sending role or component name.
    pub from: String,
    /// Receiving role, or "all" for broadcasts.
    pub to: String,
    /// Message body.
    pub content: String,
    /// Task this message relates to, if any.
    pub task_id: Option<TaskId>,
    /// Server-assigned timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with a server-assigned timestamp.
    pub fn new(from: &str, to: &str, content: &str, task_id: Option<TaskId>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            content: content.to_string(),
            task_id,
            timestamp: Utc::now(),
        }
    }

    /// Broadcast message addressed to all roles.
    pub fn broadcast(from: &str, content: &str) -> Self {
        Self::new(from, "all", content, None)
    }
}

/// Workspace side effects accumulated across all tasks in a session.
///
/// All lists are append-only. File paths are deduplicated; commands and
/// errors are kept verbatim in arrival order. The combined order across
/// concurrently running tasks is nondeterministic and must not be
/// relied upon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub files_modified: Vec<String>,
    pub commands_executed: Vec<String>,
    pub errors: Vec<String>,
}

impl WorkspaceState {
    /// Record a modified file, skipping duplicates.
    pub fn record_file(&mut self, path: &str) {
        if !self.files_modified.iter().any(|f| f == path) {
            self.files_modified.push(path.to_string());
        }
    }

    /// Record an executed command.
    pub fn record_command(&mut self, command: &str) {
        self.commands_executed.push(command.to_string());
    }

    /// Record an error surfaced by a task.
    pub fn record_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }
}

/// Aggregate state for one orchestration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// The session this context belongs to.
    pub session_id: SessionId,
    /// The plan currently being built or executed, if any.
    pub current_plan: Option<Plan>,
    /// Append-only audit log.
    pub shared_history: Vec<Message>,
    /// Accumulated side effects across all tasks.
    pub workspace: WorkspaceState,
    /// When this context was created.
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    /// Create an empty context for a session.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            current_plan: None,
            shared_history: Vec::new(),
            workspace: WorkspaceState::default(),
            created_at: Utc::now(),
        }
    }

    /// Append a message to the audit log and return a copy of it.
    pub fn push_message(&mut self, message: Message) -> Message {
        self.shared_history.push(message.clone());
        message
    }

    /// Summaries of completed tasks in the current plan.
    pub fn completed_task_summaries(&self) -> Vec<String> {
        self.current_plan
            .as_ref()
            .map(|p| p.completed_summaries())
            .unwrap_or_default()
    }
}
