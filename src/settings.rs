//! Orchestration settings.
//!
//! Settings are a read-only snapshot consumed by the engine. The embedding
//! application owns where they come from (its own settings storage, a TOML
//! file, hardcoded defaults) and hands them over through [`SettingsProvider`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::Result;

/// Default timeout for a single model call, in seconds.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 300;

/// Default cap on conversation-loop iterations per task.
pub const DEFAULT_MAX_TASK_ITERATIONS: u32 = 10;

/// Default bound on concurrently running tasks in parallel mode.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 3;

/// Configuration snapshot for the orchestration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Master switch. When false, `process_request` fails synchronously.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Model used for orchestrator-role tasks.
    pub orchestrator_model: Option<String>,
    /// Model used for planner-role tasks.
    pub planner_model: Option<String>,
    /// Ordered executor models. The selection policy picks the first entry
    /// for complex-looking tasks and the last entry otherwise.
    #[serde(default)]
    pub executor_models: Vec<String>,
    /// Run independent tasks concurrently instead of one at a time.
    #[serde(default)]
    pub enable_parallel_execution: bool,
    /// Bound on tasks in flight when parallel execution is enabled.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,
    /// Skip interactive approval of generated plans. The core does not
    /// gate on this; embedding applications that show plans for review
    /// read it to decide between `process_request` and the
    /// install-then-`execute_plan` path.
    #[serde(default)]
    pub auto_approve: bool,
    /// Carried for interface compatibility with the surrounding settings
    /// storage. Not read anywhere in the orchestration core.
    #[serde(default)]
    pub max_retries: u32,
    /// Timeout applied to each model call.
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,
    /// Iteration cap for the per-task conversation loop.
    #[serde(default = "default_max_iterations")]
    pub max_task_iterations: u32,
    /// When true, the trailing validation task generated by the planner
    /// depends on every other generated task. When false it has no
    /// dependencies and may run concurrently with the tasks it validates,
    /// matching the original behavior.
    #[serde(default)]
    pub link_validation_task: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

fn default_model_timeout() -> u64 {
    DEFAULT_MODEL_TIMEOUT_SECS
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_TASK_ITERATIONS
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            orchestrator_model: None,
            planner_model: None,
            executor_models: Vec::new(),
            enable_parallel_execution: false,
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            auto_approve: false,
            max_retries: 0,
            model_timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            max_task_iterations: DEFAULT_MAX_TASK_ITERATIONS,
            link_validation_task: false,
        }
    }
}

impl OrchestratorSettings {
    /// Load settings from a TOML file.
    ///
    /// Missing fields fall back to their defaults; a missing file is an error
    /// (callers that want defaults should use `Default`).
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Self = toml::from_str(&fs::read_to_string(path)?)?;
        tracing::debug!(
            enabled = settings.enabled,
            parallel = settings.enable_parallel_execution,
            max_concurrent = settings.max_concurrent_tasks,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Timeout for a single model call.
    pub fn model_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.model_timeout_secs)
    }
}

/// Read-only settings source consumed by the facade.
///
/// A snapshot is taken once per request so a plan executes under one
/// consistent configuration even if the application reloads settings
/// mid-flight.
pub trait SettingsProvider: Send + Sync {
    fn snapshot(&self) -> OrchestratorSettings;
}

/// A fixed settings snapshot, useful for tests and simple embeddings.
#[derive(Debug, Clone)]
pub struct StaticSettings(pub OrchestratorSettings);

impl SettingsProvider for StaticSettings {
    fn snapshot(&self) -> OrchestratorSettings {
        self.0.clone()
    }
}
