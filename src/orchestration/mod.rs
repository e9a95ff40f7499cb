//! Orchestration pipeline.
//!
//! Request in, report out: the [`classifier`] decides whether to plan,
//! the [`planner`] builds a plan, the [`scheduler`] executes it by
//! handing tasks to the [`runner`], which talks to the model and tools
//! using the [`parser`] and [`extractor`]. The [`orchestrator`] facade
//! ties it all to session state.

pub mod classifier;
pub mod extractor;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod runner;
pub mod scheduler;

pub use classifier::needs_planning;
pub use extractor::{ExtractedResult, RegexResultExtractor, ResultExtractor};
pub use orchestrator::{ChecklistItem, Orchestrator, RequestMode, TaskEdit};
pub use parser::{ToolCall, ToolCallParser};
pub use planner::PlanGenerator;
pub use runner::{select_executor_model, TaskResult, TaskRunner, MUTATION_TOOLS};
pub use scheduler::{PlanReport, Scheduler};
