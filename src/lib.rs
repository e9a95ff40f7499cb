//! Multi-agent task orchestration engine.
//!
//! Ensemble turns free-form user requests into plans of dependent tasks
//! and executes them through conversation loops against an injected
//! model client and tool executor. It is an embeddable library: the
//! host application supplies the model transport, the tool
//! implementations, session storage, and settings, and drives
//! everything through [`Orchestrator`].
//!
//! ```no_run
//! use ensemble::{
//!     InMemorySessionStore, Orchestrator, OrchestratorSettings, RegexResultExtractor,
//!     RequestMode, SessionId, StaticSettings,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(model: Arc<dyn ensemble::ModelClient>, tools: Arc<dyn ensemble::ToolExecutor>) -> ensemble::Result<()> {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(InMemorySessionStore::new()),
//!     Arc::new(StaticSettings(OrchestratorSettings::default())),
//!     model,
//!     tools,
//!     Arc::new(RegexResultExtractor::new()),
//! );
//! let report = orchestrator
//!     .process_request(&SessionId::new("session-1"), "create a login page", RequestMode::Auto)
//!     .await?;
//! println!("{}", report.stats);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod model;
pub mod orchestration;
pub mod settings;
pub mod store;
pub mod tools;

pub use crate::core::{
    AgentRole, Message, Plan, PlanGraph, PlanId, PlanStats, PlanStatus, SessionContext, SessionId,
    Task, TaskId, TaskStatus, WorkspaceState,
};
pub use error::{Error, Result};
pub use model::{ChatMessage, ModelClient};
pub use orchestration::{
    ChecklistItem, Orchestrator, PlanReport, RegexResultExtractor, RequestMode, ResultExtractor,
    TaskEdit, TaskResult,
};
pub use settings::{OrchestratorSettings, SettingsProvider, StaticSettings};
pub use store::{InMemorySessionStore, SessionStore, SharedContext};
pub use tools::{ToolExecutor, ToolSpec};
