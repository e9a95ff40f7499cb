//! Dependency-aware plan execution.
//!
//! The scheduler owns the plan-level execution loop: it selects tasks
//! whose dependencies are satisfied, hands each to the task runner, and
//! applies results back to the plan. Two strategies exist: sequential
//! (creation order, one at a time) and parallel (waves of independent
//! tasks bounded by `max_concurrent_tasks`).
//!
//! Locking discipline: the context lock is held only to inspect or
//! mutate plan state, never across a model or tool call. Runners receive
//! a task snapshot by value and record workspace effects under their own
//! short lock scopes.

use crate::core::context::Message;
use crate::core::graph::PlanGraph;
use crate::core::plan::{PlanId, PlanStats, PlanStatus};
use crate::core::task::{Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::orchestration::runner::{task_outcome_message, TaskResult, TaskRunner};
use crate::settings::OrchestratorSettings;
use crate::store::SharedContext;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Error recorded on tasks whose dependencies can never be satisfied.
const UNMET_DEPENDENCIES: &str = "dependencies not met";

/// Outcome of executing a plan.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub plan_id: PlanId,
    pub stats: PlanStats,
    pub files_modified: Vec<String>,
    pub commands_executed: Vec<String>,
    pub was_cancelled: bool,
}

/// Plan-level execution loop.
pub struct Scheduler {
    runner: TaskRunner,
    settings: OrchestratorSettings,
}

impl Scheduler {
    pub fn new(runner: TaskRunner, settings: OrchestratorSettings) -> Self {
        Self { runner, settings }
    }

    /// Execute every task in the session's current plan.
    ///
    /// # Errors
    /// Fails if the session has no plan, or if the plan's dependency
    /// graph is invalid (unknown ids or cycles). Task-level failures do
    /// not fail execution; they are reflected in the report.
    pub async fn execute(
        &self,
        ctx: &SharedContext,
        cancel: &CancellationToken,
    ) -> Result<PlanReport> {
        self.execute_scoped(ctx, cancel, None).await
    }

    /// Execute only the given tasks of the current plan.
    ///
    /// Tasks outside the scope are left untouched; scoped tasks whose
    /// dependencies cannot complete within the scope fail with an
    /// unmet-dependencies error.
    pub async fn execute_selected(
        &self,
        ctx: &SharedContext,
        cancel: &CancellationToken,
        selected: HashSet<TaskId>,
    ) -> Result<PlanReport> {
        self.execute_scoped(ctx, cancel, Some(selected)).await
    }

    async fn execute_scoped(
        &self,
        ctx: &SharedContext,
        cancel: &CancellationToken,
        scope: Option<HashSet<TaskId>>,
    ) -> Result<PlanReport> {
        let graph = {
            let mut guard = ctx.lock().await;
            let session = guard.session_id.clone();
            let plan = guard
                .current_plan
                .as_mut()
                .ok_or_else(|| Error::NoActivePlan(session.to_string()))?;
            let graph = PlanGraph::from_plan(plan)?;
            plan.status = PlanStatus::Executing;
            tracing::info!(
                plan = %plan.id.short(),
                tasks = graph.task_count(),
                dependencies = graph.dependency_count(),
                parallel = self.settings.enable_parallel_execution,
                "plan execution started"
            );
            graph
        };

        if self.settings.enable_parallel_execution {
            self.run_parallel(ctx, cancel, &graph, scope.as_ref()).await;
        } else {
            self.run_sequential(ctx, cancel, scope.as_ref()).await;
        }

        self.settle(ctx, cancel, scope.as_ref()).await
    }

    /// Run tasks one at a time in creation order.
    async fn run_sequential(
        &self,
        ctx: &SharedContext,
        cancel: &CancellationToken,
        scope: Option<&HashSet<TaskId>>,
    ) {
        let task_ids: Vec<TaskId> = {
            let guard = ctx.lock().await;
            match &guard.current_plan {
                Some(plan) => plan.tasks.iter().map(|t| t.id).collect(),
                None => return,
            }
        };

        for id in task_ids {
            if cancel.is_cancelled() {
                return;
            }
            if let Some(scope) = scope {
                if !scope.contains(&id) {
                    continue;
                }
            }

            let snapshot = {
                let mut guard = ctx.lock().await;
                let Some(plan) = guard.current_plan.as_mut() else {
                    return;
                };
                let Some(task) = plan.task(&id) else {
                    continue;
                };
                if task.status != TaskStatus::Pending {
                    continue;
                }
                if !plan.dependencies_met(task) {
                    // A dependency that has not completed by this point
                    // in creation order never will.
                    let message = fail_task(plan, &id, UNMET_DEPENDENCIES);
                    if let Some(message) = message {
                        guard.push_message(message);
                    }
                    continue;
                }
                match start_task(plan, &id) {
                    Some(snapshot) => snapshot,
                    None => continue,
                }
            };

            let result = self.runner.run(snapshot, ctx.clone(), cancel.clone()).await;
            apply_result(ctx, result).await;
        }
    }

    /// Run independent tasks in bounded waves.
    async fn run_parallel(
        &self,
        ctx: &SharedContext,
        cancel: &CancellationToken,
        graph: &PlanGraph,
        scope: Option<&HashSet<TaskId>>,
    ) {
        let limit = self.settings.max_concurrent_tasks.max(1);

        loop {
            if cancel.is_cancelled() {
                return;
            }

            let wave: Vec<Task> = {
                let mut guard = ctx.lock().await;
                let Some(plan) = guard.current_plan.as_mut() else {
                    return;
                };

                // Cascade failures before selecting the next wave, so a
                // failed dependency drains its whole subtree.
                let mut doomed_messages = Vec::new();
                loop {
                    let doomed: Vec<TaskId> = plan
                        .tasks
                        .iter()
                        .filter(|t| {
                            t.status == TaskStatus::Pending
                                && in_scope(scope, &t.id)
                                && plan.dependencies_unsatisfiable(t)
                        })
                        .map(|t| t.id)
                        .collect();
                    if doomed.is_empty() {
                        break;
                    }
                    for id in doomed {
                        if let Some(message) = fail_task(plan, &id, UNMET_DEPENDENCIES) {
                            doomed_messages.push(message);
                        }
                    }
                }

                let completed: HashSet<TaskId> = plan
                    .tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Completed)
                    .map(|t| t.id)
                    .collect();
                let ready: Vec<TaskId> = graph
                    .ready_ids(&completed)
                    .into_iter()
                    .filter(|id| in_scope(scope, id))
                    .filter(|id| {
                        plan.task(id)
                            .map(|t| t.status == TaskStatus::Pending)
                            .unwrap_or(false)
                    })
                    .take(limit)
                    .collect();
                let wave: Vec<Task> = ready
                    .iter()
                    .filter_map(|id| start_task(plan, id))
                    .collect();

                for message in doomed_messages {
                    guard.push_message(message);
                }
                wave
            };

            if wave.is_empty() {
                // Nothing ready: the plan is settled, or what remains is
                // blocked on tasks outside the scope.
                return;
            }

            let results = futures::future::join_all(
                wave.into_iter()
                    .map(|task| self.runner.run(task, ctx.clone(), cancel.clone())),
            )
            .await;

            for result in results {
                apply_result(ctx, result).await;
            }
        }
    }

    /// Settle the plan: resolve leftover tasks, finalize plan status, and
    /// append the closing audit message.
    async fn settle(
        &self,
        ctx: &SharedContext,
        cancel: &CancellationToken,
        scope: Option<&HashSet<TaskId>>,
    ) -> Result<PlanReport> {
        let mut guard = ctx.lock().await;
        let session = guard.session_id.clone();
        let workspace = guard.workspace.clone();
        let plan = guard
            .current_plan
            .as_mut()
            .ok_or_else(|| Error::NoActivePlan(session.to_string()))?;

        let was_cancelled = cancel.is_cancelled();
        let mut messages = Vec::new();

        if was_cancelled {
            for task in plan.tasks.iter_mut().filter(|t| !t.is_finished()) {
                if task.cancel().is_ok() {
                    messages.push(Message::new(
                        "scheduler",
                        "orchestrator",
                        &format!("Task {} cancelled", task.id.short()),
                        Some(task.id),
                    ));
                }
            }
            plan.status = PlanStatus::Cancelled;
        } else {
            // Scoped tasks still pending at this point were blocked on
            // work outside the scope.
            let blocked: Vec<TaskId> = plan
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending && in_scope(scope, &t.id))
                .map(|t| t.id)
                .collect();
            for id in blocked {
                if let Some(message) = fail_task(plan, &id, UNMET_DEPENDENCIES) {
                    messages.push(message);
                }
            }
            // A plan with failed tasks still finishes; failure counts are
            // surfaced through the report, not the plan status.
            plan.status = if plan.all_settled() {
                PlanStatus::Completed
            } else {
                PlanStatus::Ready
            };
        }

        let stats = plan.stats();
        let report = PlanReport {
            plan_id: plan.id,
            stats: stats.clone(),
            files_modified: workspace.files_modified,
            commands_executed: workspace.commands_executed,
            was_cancelled,
        };
        messages.push(Message::broadcast(
            "scheduler",
            &format!("Plan {} finished: {}", plan.id.short(), stats),
        ));
        tracing::info!(plan = %plan.id.short(), %stats, cancelled = was_cancelled, "plan execution finished");

        for message in messages {
            guard.push_message(message);
        }
        Ok(report)
    }
}

fn in_scope(scope: Option<&HashSet<TaskId>>, id: &TaskId) -> bool {
    scope.map(|s| s.contains(id)).unwrap_or(true)
}

/// Transition a task to in-progress and return a snapshot of it.
fn start_task(plan: &mut crate::core::plan::Plan, id: &TaskId) -> Option<Task> {
    let task = plan.task_mut(id)?;
    task.start().ok()?;
    Some(task.clone())
}

/// Fail a task and produce its audit message.
fn fail_task(plan: &mut crate::core::plan::Plan, id: &TaskId, error: &str) -> Option<Message> {
    let task = plan.task_mut(id)?;
    task.fail(error).ok()?;
    tracing::warn!(task = %id.short(), error, "task failed without running");
    Some(Message::new(
        "scheduler",
        "orchestrator",
        &format!("Task {} failed: {}", id.short(), error),
        Some(*id),
    ))
}

/// Apply a runner result to the plan's copy of the task.
async fn apply_result(ctx: &SharedContext, result: TaskResult) {
    let mut guard = ctx.lock().await;
    let Some(plan) = guard.current_plan.as_mut() else {
        return;
    };
    let Some(task) = plan.task_mut(&result.task_id) else {
        return;
    };

    let applied = if result.cancelled {
        task.cancel()
    } else if result.success {
        task.complete(&result.summary)
    } else {
        task.fail(result.error.as_deref().unwrap_or("unknown error"))
    };
    if applied.is_err() {
        // Already terminal (e.g. cancelled out from under the runner);
        // keep the first transition.
        return;
    }

    let message = task_outcome_message(task, &result);
    guard.push_message(message);
}
