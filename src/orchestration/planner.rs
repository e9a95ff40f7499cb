//! Plan generator.
//!
//! Turns a request into an ordered set of tasks by matching the text
//! against a fixed keyword table per task category. Each matched
//! category yields exactly one task (repeated keyword hits collapse);
//! a request matching nothing yields a single fallback task. A trailing
//! validation task is always appended.

use crate::core::plan::Plan;
use crate::core::task::{AgentRole, Task, TaskId};
use std::collections::BTreeSet;

/// Maximum characters of the raw request carried into the fallback
/// task description.
const FALLBACK_DESCRIPTION_CHARS: usize = 120;

/// Work categories recognized by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskCategory {
    Create,
    Edit,
    Read,
    Terminal,
    Test,
    Build,
    Refactor,
    Fix,
    Browser,
}

impl TaskCategory {
    /// All categories, in the order their tasks are created.
    pub const ALL: &'static [TaskCategory] = &[
        TaskCategory::Create,
        TaskCategory::Edit,
        TaskCategory::Read,
        TaskCategory::Terminal,
        TaskCategory::Test,
        TaskCategory::Build,
        TaskCategory::Refactor,
        TaskCategory::Fix,
        TaskCategory::Browser,
    ];

    /// Keywords that match this category, English and Portuguese.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            TaskCategory::Create => &[
                "create", "criar", "new file", "novo arquivo", "generate", "gerar", "scaffold",
            ],
            TaskCategory::Edit => &[
                "edit", "editar", "modify", "modificar", "change", "alterar", "update",
                "atualizar",
            ],
            TaskCategory::Read => &[
                "read", "ler", "show", "mostrar", "open", "abrir", "inspect", "analisar",
            ],
            TaskCategory::Terminal => &[
                "run", "executar", "command", "comando", "terminal", "shell", "install",
                "instalar",
            ],
            TaskCategory::Test => &["test", "testar", "teste", "spec", "coverage", "cobertura"],
            TaskCategory::Build => &["build", "compile", "compilar", "bundle", "empacotar"],
            TaskCategory::Refactor => &[
                "refactor",
                "refatorar",
                "restructure",
                "reestruturar",
                "clean up",
                "limpar",
            ],
            TaskCategory::Fix => &["fix", "corrigir", "consertar", "bug", "error", "erro"],
            TaskCategory::Browser => &[
                "browser",
                "navegador",
                "navigate",
                "navegar",
                "website",
                "url",
                "screenshot",
            ],
        }
    }

    /// Category-specific task description for a request.
    fn describe(&self, request: &str) -> String {
        match self {
            TaskCategory::Create => {
                format!("Create the files and folders required by: {}", request)
            }
            TaskCategory::Edit => format!("Apply the code edits required by: {}", request),
            TaskCategory::Read => format!("Read and analyze the files relevant to: {}", request),
            TaskCategory::Terminal => {
                format!("Run the terminal commands required by: {}", request)
            }
            TaskCategory::Test => format!("Write and run tests covering: {}", request),
            TaskCategory::Build => format!("Build the project and resolve build issues for: {}", request),
            TaskCategory::Refactor => format!("Refactor the code as requested by: {}", request),
            TaskCategory::Fix => format!("Diagnose and fix the problem described by: {}", request),
            TaskCategory::Browser => {
                format!("Perform the browser actions required by: {}", request)
            }
        }
    }
}

/// Plan generator.
///
/// `link_validation` controls whether the trailing validation task
/// declares dependencies on the generated tasks. The original behavior
/// leaves it dependency-free, which lets it run concurrently with (or
/// before) the tasks it validates in parallel mode; that behavior is
/// preserved by default and made explicit here.
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    pub link_validation: bool,
}

impl PlanGenerator {
    pub fn new(link_validation: bool) -> Self {
        Self { link_validation }
    }

    /// Generate a plan for a request.
    ///
    /// Matched categories are collected into a set, so repeated keyword
    /// hits produce one task per category. All tasks start pending with
    /// no model assigned; models are resolved at execution time.
    pub fn generate(&self, request: &str) -> Plan {
        let lowered = request.to_lowercase();
        let matched: BTreeSet<TaskCategory> = TaskCategory::ALL
            .iter()
            .copied()
            .filter(|cat| cat.keywords().iter().any(|kw| lowered.contains(kw)))
            .collect();

        let mut tasks: Vec<Task> = if matched.is_empty() {
            vec![Task::new(
                &format!("Carry out the request: {}", truncate(request)),
                AgentRole::Executor,
            )]
        } else {
            matched
                .iter()
                .map(|cat| Task::new(&cat.describe(request), AgentRole::Executor))
                .collect()
        };

        let generated_ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        let mut validation = Task::new(
            "Validate that the results satisfy the original request",
            AgentRole::Reviewer,
        );
        if self.link_validation {
            validation.dependencies = generated_ids;
        }
        tasks.push(validation);

        tracing::debug!(
            categories = matched.len(),
            tasks = tasks.len(),
            "plan generated"
        );
        Plan::new(request, tasks)
    }
}

fn truncate(request: &str) -> String {
    if request.chars().count() <= FALLBACK_DESCRIPTION_CHARS {
        request.to_string()
    } else {
        let head: String = request.chars().take(FALLBACK_DESCRIPTION_CHARS).collect();
        format!("{}...", head)
    }
}
