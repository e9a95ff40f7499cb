//! Orchestrator facade.
//!
//! Top-level entry point tying the pieces together: session lifecycle,
//! request classification, plan generation and validation, execution,
//! cancellation, and manual plan editing. Collaborators (model client,
//! tool executor, session store, settings source, result extractor) are
//! injected so embeddings and tests control every seam.

use crate::core::context::{Message, SessionContext, SessionId};
use crate::core::graph::PlanGraph;
use crate::core::plan::{Plan, PlanId};
use crate::core::task::{AgentRole, Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::model::ModelClient;
use crate::orchestration::classifier::needs_planning;
use crate::orchestration::extractor::ResultExtractor;
use crate::orchestration::planner::PlanGenerator;
use crate::orchestration::runner::TaskRunner;
use crate::orchestration::scheduler::{PlanReport, Scheduler};
use crate::settings::SettingsProvider;
use crate::store::{SessionStore, SharedContext};
use crate::tools::ToolExecutor;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// How to treat an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Let the classifier decide.
    #[default]
    Auto,
    /// Run as a single task without planning.
    Direct,
    /// Always generate a plan.
    Plan,
}

/// One item of a user-authored checklist plan.
///
/// Dependencies are indices into the checklist, resolved to task ids
/// when the plan is built.
#[derive(Debug, Clone)]
pub struct ChecklistItem {
    pub description: String,
    pub depends_on: Vec<usize>,
    pub model: Option<String>,
}

impl ChecklistItem {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            depends_on: Vec::new(),
            model: None,
        }
    }
}

/// A user edit to one pending task of the current plan.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub task_id: TaskId,
    pub description: Option<String>,
    pub dependencies: Option<Vec<TaskId>>,
    pub model: Option<String>,
    pub selected: Option<bool>,
}

/// Top-level orchestration engine.
pub struct Orchestrator {
    store: Arc<dyn SessionStore>,
    settings: Arc<dyn SettingsProvider>,
    model: Arc<dyn ModelClient>,
    tools: Arc<dyn ToolExecutor>,
    extractor: Arc<dyn ResultExtractor>,
    /// Cancellation tokens for runs in flight, keyed by session.
    active: Mutex<HashMap<SessionId, CancellationToken>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        settings: Arc<dyn SettingsProvider>,
        model: Arc<dyn ModelClient>,
        tools: Arc<dyn ToolExecutor>,
        extractor: Arc<dyn ResultExtractor>,
    ) -> Self {
        Self {
            store,
            settings,
            model,
            tools,
            extractor,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Process a user request end to end: classify, plan, execute.
    ///
    /// # Errors
    /// Fails when orchestration is disabled in settings, or when the
    /// generated plan does not validate. Task-level failures do not fail
    /// the request; they show up in the report's counts.
    pub async fn process_request(
        &self,
        session: &SessionId,
        request: &str,
        mode: RequestMode,
    ) -> Result<PlanReport> {
        let settings = self.settings.snapshot();
        if !settings.enabled {
            return Err(Error::Disabled);
        }

        let ctx = self.store.get_or_create(session).await;
        {
            let mut guard = ctx.lock().await;
            let has_plan = guard.current_plan.is_some();
            let planned = match mode {
                RequestMode::Auto => needs_planning(request, has_plan),
                RequestMode::Direct => false,
                RequestMode::Plan => true,
            };

            let plan = if planned {
                PlanGenerator::new(settings.link_validation_task).generate(request)
            } else {
                Plan::new(request, vec![Task::new(request, AgentRole::Executor)])
            };
            PlanGraph::from_plan(&plan)?;

            tracing::info!(
                session = %session,
                plan = %plan.id.short(),
                tasks = plan.tasks.len(),
                planned,
                "request accepted"
            );
            guard.push_message(Message::broadcast(
                "orchestrator",
                &format!(
                    "Plan {} created with {} task(s) for: {}",
                    plan.id.short(),
                    plan.tasks.len(),
                    request
                ),
            ));
            guard.current_plan = Some(plan);
        }

        let cancel = self.register_run(session).await;
        let scheduler = self.scheduler(settings);
        let result = scheduler.execute(&ctx, &cancel).await;
        self.finish_run(session).await;
        result
    }

    /// Execute the session's current plan as it stands.
    ///
    /// This is the approval path for plans installed via
    /// [`Self::create_plan_from_checklist`] or edited with
    /// [`Self::refine_plan`].
    pub async fn execute_plan(&self, session: &SessionId) -> Result<PlanReport> {
        let settings = self.settings.snapshot();
        if !settings.enabled {
            return Err(Error::Disabled);
        }

        let ctx = self.context(session).await?;
        let cancel = self.register_run(session).await;
        let scheduler = self.scheduler(settings);
        let result = scheduler.execute(&ctx, &cancel).await;
        self.finish_run(session).await;
        result
    }

    /// Execute only the given tasks of the session's current plan.
    ///
    /// The chosen tasks are flagged as selected; everything else keeps
    /// its status.
    pub async fn execute_selected_tasks(
        &self,
        session: &SessionId,
        task_ids: Vec<TaskId>,
    ) -> Result<PlanReport> {
        let settings = self.settings.snapshot();
        if !settings.enabled {
            return Err(Error::Disabled);
        }

        let ctx = self.context(session).await?;
        let scope: HashSet<TaskId> = task_ids.iter().copied().collect();
        {
            let mut guard = ctx.lock().await;
            let session_name = guard.session_id.to_string();
            let plan = guard
                .current_plan
                .as_mut()
                .ok_or(Error::NoActivePlan(session_name))?;
            for id in &task_ids {
                let task = plan
                    .task_mut(id)
                    .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
                task.selected = true;
            }
        }

        let cancel = self.register_run(session).await;
        let scheduler = self.scheduler(settings);
        let result = scheduler.execute_selected(&ctx, &cancel, scope).await;
        self.finish_run(session).await;
        result
    }

    /// Install a user-authored plan built from checklist items.
    ///
    /// # Errors
    /// Fails on unknown sessions, dependency indices out of range, or a
    /// plan that does not validate (cycles).
    pub async fn create_plan_from_checklist(
        &self,
        session: &SessionId,
        request: &str,
        items: Vec<ChecklistItem>,
    ) -> Result<PlanId> {
        if items.is_empty() {
            return Err(Error::Validation("checklist is empty".to_string()));
        }

        let mut tasks: Vec<Task> = items
            .iter()
            .map(|item| {
                let mut task = Task::new(&item.description, AgentRole::Executor);
                task.user_edited = true;
                if let Some(model) = &item.model {
                    task.assign_model(model);
                }
                task
            })
            .collect();
        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        for (index, item) in items.iter().enumerate() {
            let mut dependencies = Vec::new();
            for &dep in &item.depends_on {
                let id = *ids.get(dep).ok_or_else(|| {
                    Error::Validation(format!(
                        "checklist item {} depends on out-of-range item {}",
                        index, dep
                    ))
                })?;
                dependencies.push(id);
            }
            tasks[index].dependencies = dependencies;
        }

        let plan = Plan::new(request, tasks);
        PlanGraph::from_plan(&plan)?;
        let plan_id = plan.id;

        let ctx = self.store.get_or_create(session).await;
        let mut guard = ctx.lock().await;
        guard.push_message(Message::broadcast(
            "orchestrator",
            &format!(
                "Plan {} created from a {}-item checklist",
                plan_id.short(),
                items.len()
            ),
        ));
        guard.current_plan = Some(plan);
        Ok(plan_id)
    }

    /// Apply user edits to pending tasks of the current plan.
    ///
    /// Edits are validated as a whole against the resulting dependency
    /// graph; on failure nothing is applied.
    pub async fn refine_plan(&self, session: &SessionId, edits: Vec<TaskEdit>) -> Result<()> {
        let ctx = self.context(session).await?;
        let mut guard = ctx.lock().await;
        let session_name = guard.session_id.to_string();
        let plan = guard
            .current_plan
            .as_mut()
            .ok_or(Error::NoActivePlan(session_name))?;

        // Stage on a copy so a bad edit set leaves the plan untouched.
        let mut staged = plan.clone();
        for edit in &edits {
            let task = staged
                .task_mut(&edit.task_id)
                .ok_or_else(|| Error::TaskNotFound(edit.task_id.to_string()))?;
            if task.status != TaskStatus::Pending {
                return Err(Error::Validation(format!(
                    "task {} is {} and can no longer be edited",
                    task.id.short(),
                    task.status
                )));
            }
            if let Some(description) = &edit.description {
                task.description = description.clone();
            }
            if let Some(dependencies) = &edit.dependencies {
                task.dependencies = dependencies.clone();
            }
            if let Some(model) = &edit.model {
                task.assign_model(model);
            }
            if let Some(selected) = edit.selected {
                task.selected = selected;
            }
            task.user_edited = true;
        }
        PlanGraph::from_plan(&staged)?;

        *plan = staged;
        guard.push_message(Message::broadcast(
            "orchestrator",
            &format!("Plan refined: {} task(s) edited", edits.len()),
        ));
        Ok(())
    }

    /// Reassign the executor model of one pending task.
    pub async fn update_task_assignment(
        &self,
        session: &SessionId,
        task_id: &TaskId,
        model: &str,
    ) -> Result<()> {
        self.refine_plan(
            session,
            vec![TaskEdit {
                task_id: *task_id,
                model: Some(model.to_string()),
                ..Default::default()
            }],
        )
        .await
    }

    /// Request cancellation of the session's current plan.
    ///
    /// Signals the run in flight (if any) and immediately cancels tasks
    /// that have not started; running tasks stop cooperatively at their
    /// next checkpoint.
    pub async fn cancel_plan(&self, session: &SessionId) -> Result<()> {
        if let Some(token) = self.active.lock().await.get(session) {
            token.cancel();
        }

        let ctx = self.context(session).await?;
        let mut guard = ctx.lock().await;
        let session_name = guard.session_id.to_string();
        let plan = guard
            .current_plan
            .as_mut()
            .ok_or(Error::NoActivePlan(session_name))?;

        for task in plan.tasks.iter_mut() {
            if task.status == TaskStatus::Pending {
                // Infallible from Pending.
                let _ = task.cancel();
            }
        }
        let plan_id = plan.id;
        plan.status = crate::core::plan::PlanStatus::Cancelled;
        guard.push_message(Message::broadcast(
            "orchestrator",
            &format!("Plan {} cancellation requested", plan_id.short()),
        ));
        tracing::info!(session = %session, plan = %plan_id.short(), "plan cancelled");
        Ok(())
    }

    /// Snapshot of a session's context.
    pub async fn get_context(&self, session: &SessionId) -> Result<SessionContext> {
        let ctx = self.context(session).await?;
        let guard = ctx.lock().await;
        Ok(guard.clone())
    }

    /// Append a message to a session's audit log, creating the session
    /// if needed. The timestamp is assigned here, never by the caller.
    pub async fn add_agent_message(
        &self,
        session: &SessionId,
        from: &str,
        to: &str,
        content: &str,
        task_id: Option<TaskId>,
    ) -> Result<Message> {
        let ctx = self.store.get_or_create(session).await;
        let mut guard = ctx.lock().await;
        Ok(guard.push_message(Message::new(from, to, content, task_id)))
    }

    async fn context(&self, session: &SessionId) -> Result<SharedContext> {
        self.store
            .get(session)
            .await
            .ok_or_else(|| Error::SessionNotFound(session.to_string()))
    }

    fn scheduler(&self, settings: crate::settings::OrchestratorSettings) -> Scheduler {
        let runner = TaskRunner::new(
            self.model.clone(),
            self.tools.clone(),
            self.extractor.clone(),
            settings.clone(),
        );
        Scheduler::new(runner, settings)
    }

    async fn register_run(&self, session: &SessionId) -> CancellationToken {
        let token = CancellationToken::new();
        self.active
            .lock()
            .await
            .insert(session.clone(), token.clone());
        token
    }

    async fn finish_run(&self, session: &SessionId) {
        self.active.lock().await.remove(session);
    }
}
