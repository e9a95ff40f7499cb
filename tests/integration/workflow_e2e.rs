//! End-to-end workflow tests: request in, report and session state out.

use crate::fixtures::*;
use ensemble::{PlanStatus, RequestMode, TaskStatus};
use serde_json::json;

#[tokio::test]
async fn test_request_to_completed_plan() {
    init_tracing();
    let orch = orchestrator(
        ScriptedModel::new(),
        RecordingTools::new(),
        sequential_settings(),
    );
    let id = session("e2e");

    let report = orch
        .process_request(&id, "create a login page and test it", RequestMode::Auto)
        .await
        .unwrap();

    // Create task, test task, trailing validation task.
    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.completed, 3);
    assert_eq!(report.stats.failed, 0);
    assert!(!report.was_cancelled);

    let ctx = orch.get_context(&id).await.unwrap();
    let plan = ctx.current_plan.unwrap();
    assert_eq!(plan.status, PlanStatus::Completed);
    assert!(plan.tasks.iter().all(|t| t.status == TaskStatus::Completed));
    assert!(plan.tasks.iter().all(|t| t.result.is_some()));
}

#[tokio::test]
async fn test_tool_calls_flow_into_workspace_state() {
    let model = ScriptedModel::new();
    model.script(
        "login page",
        &[
            r#"<tool_call>create_file_or_folder</tool_call><tool_params>{"path": "src/login.rs", "content": "// login"}</tool_params>"#,
            r#"<tool_call>run_command</tool_call><tool_params>{"command": "cargo check"}</tool_params>"#,
            "Summary: login page created\nFiles: src/login.rs",
        ],
    );
    let tools = RecordingTools::new();
    let orch = orchestrator(model, tools.clone(), sequential_settings());
    let id = session("tools");

    let report = orch
        .process_request(&id, "make a login page please", RequestMode::Direct)
        .await
        .unwrap();

    assert_eq!(report.stats.completed, 1);
    assert_eq!(
        tools.call_names(),
        vec!["create_file_or_folder", "run_command"]
    );
    assert_eq!(report.files_modified, vec!["src/login.rs"]);
    assert_eq!(report.commands_executed, vec!["cargo check"]);

    let ctx = orch.get_context(&id).await.unwrap();
    assert_eq!(ctx.workspace.files_modified, vec!["src/login.rs"]);
    assert_eq!(ctx.workspace.commands_executed, vec!["cargo check"]);

    let calls = tools.calls.lock().unwrap();
    assert_eq!(
        calls[0].1,
        json!({"path": "src/login.rs", "content": "// login"})
    );
}

#[tokio::test]
async fn test_completed_summaries_feed_later_tasks() {
    let model = ScriptedModel::new();
    model.script("Create the files", &["Summary: created the scaffolding"]);
    let orch = orchestrator(model, RecordingTools::new(), sequential_settings());
    let id = session("summaries");

    orch.process_request(&id, "create and test the module", RequestMode::Auto)
        .await
        .unwrap();

    let ctx = orch.get_context(&id).await.unwrap();
    let summaries = ctx.completed_task_summaries();
    assert!(summaries
        .iter()
        .any(|s| s.contains("created the scaffolding")));
}

#[tokio::test]
async fn test_failed_task_reflected_in_report_not_error() {
    let model = ScriptedModel::new();
    model.script("Write and run tests", &["__fail__"]);
    let orch = orchestrator(model, RecordingTools::new(), sequential_settings());
    let id = session("partial");

    let report = orch
        .process_request(&id, "create and test the module", RequestMode::Auto)
        .await
        .unwrap();

    assert_eq!(report.stats.failed, 1);
    assert!(report.stats.completed >= 1);

    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    let failed = plan
        .tasks
        .iter()
        .find(|t| t.status == TaskStatus::Failed)
        .unwrap();
    assert!(failed.error.as_deref().unwrap().contains("scripted failure"));
    // The plan still finishes.
    assert_eq!(plan.status, PlanStatus::Completed);
}

#[tokio::test]
async fn test_audit_log_is_append_only_and_monotonic() {
    let orch = orchestrator(
        ScriptedModel::new(),
        RecordingTools::new(),
        sequential_settings(),
    );
    let id = session("audit");

    orch.add_agent_message(&id, "user", "orchestrator", "starting work", None)
        .await
        .unwrap();
    orch.process_request(&id, "create a widget", RequestMode::Auto)
        .await
        .unwrap();
    orch.add_agent_message(&id, "user", "orchestrator", "thanks", None)
        .await
        .unwrap();

    let history = orch.get_context(&id).await.unwrap().shared_history;
    // User bookends plus plan-created, per-task, and plan-finished entries.
    assert!(history.len() >= 5);
    for pair in history.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert_eq!(history.first().unwrap().content, "starting work");
    assert_eq!(history.last().unwrap().content, "thanks");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let orch = orchestrator(
        ScriptedModel::new(),
        RecordingTools::new(),
        sequential_settings(),
    );

    orch.process_request(&session("alpha"), "create a widget", RequestMode::Auto)
        .await
        .unwrap();

    let alpha = orch.get_context(&session("alpha")).await.unwrap();
    assert!(alpha.current_plan.is_some());
    assert!(orch.get_context(&session("beta")).await.is_err());
}

#[tokio::test]
async fn test_no_executor_model_degrades_gracefully() {
    let settings = ensemble::OrchestratorSettings::default();
    assert!(settings.executor_models.is_empty());
    let orch = orchestrator(ScriptedModel::new(), RecordingTools::new(), settings);
    let id = session("no-model");

    let report = orch
        .process_request(&id, "create a widget", RequestMode::Direct)
        .await
        .unwrap();

    // Completed without a single model call.
    assert_eq!(report.stats.completed, 1);
    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    assert!(plan.tasks[0]
        .result
        .as_deref()
        .unwrap()
        .contains("No executor model"));
}
