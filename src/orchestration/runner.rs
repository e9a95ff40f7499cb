//! Task runner.
//!
//! Drives one task to completion through a conversation loop: build
//! prompts, call the model, parse tool calls, invoke tools, feed tool
//! results back, and loop until the model produces a tool-call-free
//! response or the iteration cap is reached.

use crate::core::context::Message;
use crate::core::task::{Task, TaskId};
use crate::error::Error;
use crate::model::{complete_with_timeout, ChatMessage, ModelClient};
use crate::orchestration::extractor::ResultExtractor;
use crate::orchestration::parser::ToolCallParser;
use crate::settings::OrchestratorSettings;
use crate::store::SharedContext;
use crate::tools::ToolExecutor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Tools that mutate the workspace. Invocations of these are recorded
/// into the session's workspace state as they happen.
pub const MUTATION_TOOLS: &[&str] = &["run_command", "create_file_or_folder", "rewrite_file"];

/// Keywords that route a task to the strongest executor model.
const COMPLEX_TASK_KEYWORDS: &[&str] = &[
    "refactor",
    "architecture",
    "complex",
    "migrate",
    "integrate",
    "design",
];

/// Outcome of running one task.
///
/// The runner never mutates the plan; the scheduler applies this result
/// to the task it belongs to.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub success: bool,
    pub summary: String,
    pub files_modified: Vec<String>,
    pub commands_executed: Vec<String>,
    pub browser_actions: Vec<String>,
    pub error: Option<String>,
    pub cancelled: bool,
    pub iterations: u32,
}

impl TaskResult {
    fn completed(task_id: TaskId, summary: String, iterations: u32) -> Self {
        Self {
            task_id,
            success: true,
            summary,
            files_modified: Vec::new(),
            commands_executed: Vec::new(),
            browser_actions: Vec::new(),
            error: None,
            cancelled: false,
            iterations,
        }
    }

    fn failed(task_id: TaskId, error: String, iterations: u32) -> Self {
        Self {
            task_id,
            success: false,
            summary: String::new(),
            files_modified: Vec::new(),
            commands_executed: Vec::new(),
            browser_actions: Vec::new(),
            error: Some(error),
            cancelled: false,
            iterations,
        }
    }

    fn cancelled(task_id: TaskId, iterations: u32) -> Self {
        Self {
            task_id,
            success: false,
            summary: String::new(),
            files_modified: Vec::new(),
            commands_executed: Vec::new(),
            browser_actions: Vec::new(),
            error: None,
            cancelled: true,
            iterations,
        }
    }
}

/// Pick an executor model for a task.
///
/// Tasks whose description suggests heavier work get the first (assumed
/// strongest) configured model; everything else gets the last (assumed
/// cheapest). With no models configured there is nothing to pick.
pub fn select_executor_model(description: &str, executor_models: &[String]) -> Option<String> {
    if executor_models.is_empty() {
        return None;
    }
    let lowered = description.to_lowercase();
    let looks_complex = COMPLEX_TASK_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    if looks_complex && executor_models.len() > 1 {
        executor_models.first().cloned()
    } else {
        executor_models.last().cloned()
    }
}

/// Per-task conversation loop.
pub struct TaskRunner {
    model: Arc<dyn ModelClient>,
    tools: Arc<dyn ToolExecutor>,
    extractor: Arc<dyn ResultExtractor>,
    parser: ToolCallParser,
    settings: OrchestratorSettings,
}

impl TaskRunner {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolExecutor>,
        extractor: Arc<dyn ResultExtractor>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            model,
            tools,
            extractor,
            parser: ToolCallParser::new(),
            settings,
        }
    }

    /// Run one task to a result.
    ///
    /// The task is received by value as a snapshot already marked
    /// in-progress by the scheduler; status transitions on the plan's
    /// copy are the scheduler's job. Workspace side effects are recorded
    /// into the shared context as they occur, under short lock scopes.
    ///
    /// This never returns an error: model failures produce a
    /// failed-style result, tool failures are fed back to the model as
    /// conversation messages, and cap exhaustion returns a best-effort
    /// parse of the last response.
    pub async fn run(
        &self,
        task: Task,
        ctx: SharedContext,
        cancel: CancellationToken,
    ) -> TaskResult {
        let Some(model_id) = task
            .model
            .clone()
            .or_else(|| select_executor_model(&task.description, &self.settings.executor_models))
        else {
            // Graceful degradation, not a failure.
            tracing::warn!(task = %task.id.short(), "no executor model configured");
            return TaskResult::completed(
                task.id,
                "No executor model configured; task skipped".to_string(),
                0,
            );
        };

        let mut messages = vec![
            ChatMessage::system(&self.system_prompt()),
            ChatMessage::user(&self.user_prompt(&task, &ctx).await),
        ];

        // Side effects this task has already recorded, so final-response
        // extraction does not double-count them.
        let mut files: Vec<String> = Vec::new();
        let mut commands: Vec<String> = Vec::new();

        let mut last_response = String::new();
        let mut iterations = 0;

        while iterations < self.settings.max_task_iterations {
            if cancel.is_cancelled() {
                tracing::info!(task = %task.id.short(), iterations, "task cancelled");
                return TaskResult::cancelled(task.id, iterations);
            }
            iterations += 1;

            let response = match complete_with_timeout(
                self.model.as_ref(),
                &model_id,
                &messages,
                self.settings.model_timeout(),
            )
            .await
            {
                Ok(text) => text,
                Err(err) => {
                    let error = format!("model call failed: {}", err);
                    tracing::error!(task = %task.id.short(), iterations, %error);
                    ctx.lock().await.workspace.record_error(&error);
                    return TaskResult::failed(task.id, error, iterations);
                }
            };
            last_response = response.clone();

            let Some(call) = self.parser.parse(&response) else {
                // Final response: extract structured fields and finish.
                let mut result = self.finish(task.id, &response, iterations);
                self.merge_side_effects(&ctx, &mut result, &mut files, &mut commands)
                    .await;
                return result;
            };

            tracing::debug!(task = %task.id.short(), tool = %call.name, iterations, "tool call");
            let outcome = if self.tools.has_tool(&call.name) {
                self.tools.execute(&call.name, &call.params).await
            } else {
                Err(Error::Tool(format!("unknown tool: {}", call.name)))
            };

            if outcome.is_ok() && MUTATION_TOOLS.contains(&call.name.as_str()) {
                self.record_mutation(&ctx, &call.name, &call.params, &mut files, &mut commands)
                    .await;
            }

            // The model's turn and the tool's answer stay adjacent in the
            // conversation, success or failure alike.
            messages.push(ChatMessage::assistant(&response));
            messages.push(ChatMessage::user(&match outcome {
                Ok(output) => format!("Tool {} result:\n{}", call.name, output),
                Err(err) => format!("Tool {} failed: {}", call.name, err),
            }));
        }

        // Cap exhausted: take the last response as final rather than
        // failing the task.
        tracing::warn!(task = %task.id.short(), iterations, "iteration cap reached");
        let mut result = self.finish(task.id, &last_response, iterations);
        self.merge_side_effects(&ctx, &mut result, &mut files, &mut commands)
            .await;
        result
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are an executor agent working on one task of a larger plan.\n\
             Use a tool when the task requires acting on the workspace; answer\n\
             directly when it does not.\n\nAvailable tools:\n",
        );
        for tool in self.tools.list_tools() {
            prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }
        prompt.push_str(
            "\nTo invoke a tool, respond with exactly:\n\
             <tool_call>TOOL_NAME</tool_call><tool_params>{\"param\": \"value\"}</tool_params>\n\
             One tool call per response. When the task is done, respond without\n\
             a tool call and include lines starting with 'Summary:', 'Files:'\n\
             and 'Commands:' describing what you did.",
        );
        prompt
    }

    async fn user_prompt(&self, task: &Task, ctx: &SharedContext) -> String {
        let (summaries, files, commands) = {
            let guard = ctx.lock().await;
            (
                guard.completed_task_summaries(),
                guard.workspace.files_modified.clone(),
                guard.workspace.commands_executed.clone(),
            )
        };

        let mut prompt = format!("Task: {}", task.description);
        if !summaries.is_empty() {
            prompt.push_str("\n\nCompleted tasks so far:\n");
            for summary in summaries {
                prompt.push_str(&format!("- {}\n", summary));
            }
        }
        if !files.is_empty() {
            prompt.push_str(&format!("\nFiles modified so far: {}", files.join(", ")));
        }
        if !commands.is_empty() {
            prompt.push_str(&format!(
                "\nCommands executed so far: {}",
                commands.join(", ")
            ));
        }
        prompt
    }

    async fn record_mutation(
        &self,
        ctx: &SharedContext,
        name: &str,
        params: &serde_json::Value,
        files: &mut Vec<String>,
        commands: &mut Vec<String>,
    ) {
        match name {
            "run_command" => {
                if let Some(command) = params.get("command").and_then(|v| v.as_str()) {
                    ctx.lock().await.workspace.record_command(command);
                    commands.push(command.to_string());
                }
            }
            "create_file_or_folder" | "rewrite_file" => {
                let path = params
                    .get("path")
                    .or_else(|| params.get("file_path"))
                    .and_then(|v| v.as_str());
                if let Some(path) = path {
                    ctx.lock().await.workspace.record_file(path);
                    if !files.iter().any(|f| f == path) {
                        files.push(path.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    /// Build a completed result from a final response via the extractor.
    fn finish(&self, task_id: TaskId, response: &str, iterations: u32) -> TaskResult {
        let extracted = self.extractor.extract(response);
        let mut result = TaskResult::completed(task_id, extracted.summary, iterations);
        result.files_modified = extracted.files;
        result.commands_executed = extracted.commands;
        result.browser_actions = extracted.browser_actions;
        result
    }

    /// Merge effects recorded during the loop with the extracted ones and
    /// push any newly reported files/commands into the workspace.
    async fn merge_side_effects(
        &self,
        ctx: &SharedContext,
        result: &mut TaskResult,
        files: &mut Vec<String>,
        commands: &mut Vec<String>,
    ) {
        {
            let mut guard = ctx.lock().await;
            for file in &result.files_modified {
                if !files.iter().any(|f| f == file) {
                    guard.workspace.record_file(file);
                    files.push(file.clone());
                }
            }
            for command in &result.commands_executed {
                if !commands.iter().any(|c| c == command) {
                    guard.workspace.record_command(command);
                    commands.push(command.clone());
                }
            }
        }
        result.files_modified = files.clone();
        result.commands_executed = commands.clone();
    }
}

/// Audit-log line for a settled task.
pub fn task_outcome_message(task: &Task, result: &TaskResult) -> Message {
    let content = if result.cancelled {
        format!("Task {} cancelled", task.id.short())
    } else if result.success {
        format!("Task {} completed: {}", task.id.short(), result.summary)
    } else {
        format!(
            "Task {} failed: {}",
            task.id.short(),
            result.error.as_deref().unwrap_or("unknown error")
        )
    };
    Message::new(task.role.as_str(), "orchestrator", &content, Some(task.id))
}
