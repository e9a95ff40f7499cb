//! Core data model: tasks, plans, dependency graph, and session context.

pub mod context;
pub mod graph;
pub mod plan;
pub mod task;

pub use context::{Message, SessionContext, SessionId, WorkspaceState};
pub use graph::PlanGraph;
pub use plan::{Plan, PlanId, PlanStats, PlanStatus};
pub use task::{AgentRole, Task, TaskId, TaskStatus};
