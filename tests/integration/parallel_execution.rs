//! Parallel scheduling correctness: concurrency bounds and ordering.

use crate::fixtures::*;
use ensemble::{ChecklistItem, TaskStatus};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_concurrency_never_exceeds_bound() {
    let model = GaugeModel::new();
    let orch = orchestrator(model.clone(), RecordingTools::new(), parallel_settings(2));
    let id = session("bounded");

    let items: Vec<ChecklistItem> = (0..5)
        .map(|i| ChecklistItem::new(&format!("independent step {}", i)))
        .collect();
    orch.create_plan_from_checklist(&id, "five independent steps", items)
        .await
        .unwrap();

    let report = orch.execute_plan(&id).await.unwrap();

    assert_eq!(report.stats.completed, 5);
    let peak = model.peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency was {}", peak);
    assert!(peak >= 1);
    assert_eq!(model.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_dependent_task_starts_after_dependency_completes() {
    let orch = orchestrator(GaugeModel::new(), RecordingTools::new(), parallel_settings(4));
    let id = session("ordering");

    let items = vec![
        ChecklistItem::new("lay the groundwork"),
        ChecklistItem {
            description: "build on the groundwork".to_string(),
            depends_on: vec![0],
            model: None,
        },
    ];
    orch.create_plan_from_checklist(&id, "two ordered steps", items)
        .await
        .unwrap();

    let report = orch.execute_plan(&id).await.unwrap();
    assert_eq!(report.stats.completed, 2);

    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    let first = &plan.tasks[0];
    let second = &plan.tasks[1];
    assert!(first.completed_at.unwrap() <= second.started_at.unwrap());
}

#[tokio::test]
async fn test_diamond_joins_before_final_task() {
    let orch = orchestrator(GaugeModel::new(), RecordingTools::new(), parallel_settings(4));
    let id = session("diamond");

    let items = vec![
        ChecklistItem::new("root step"),
        ChecklistItem {
            description: "left branch".to_string(),
            depends_on: vec![0],
            model: None,
        },
        ChecklistItem {
            description: "right branch".to_string(),
            depends_on: vec![0],
            model: None,
        },
        ChecklistItem {
            description: "join step".to_string(),
            depends_on: vec![1, 2],
            model: None,
        },
    ];
    orch.create_plan_from_checklist(&id, "diamond", items)
        .await
        .unwrap();

    let report = orch.execute_plan(&id).await.unwrap();
    assert_eq!(report.stats.completed, 4);

    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    let join_start = plan.tasks[3].started_at.unwrap();
    assert!(plan.tasks[1].completed_at.unwrap() <= join_start);
    assert!(plan.tasks[2].completed_at.unwrap() <= join_start);
}

#[tokio::test]
async fn test_parallel_failure_cascades_to_dependents() {
    let model = GaugeModel::failing_on(&["doomed step"]);
    let orch = orchestrator(model.clone(), RecordingTools::new(), parallel_settings(3));
    let id = session("cascade");

    let items = vec![
        ChecklistItem::new("doomed step"),
        ChecklistItem {
            description: "depends on doomed".to_string(),
            depends_on: vec![0],
            model: None,
        },
        ChecklistItem {
            description: "transitively doomed".to_string(),
            depends_on: vec![1],
            model: None,
        },
        ChecklistItem::new("unrelated step"),
    ];
    orch.create_plan_from_checklist(&id, "cascade", items)
        .await
        .unwrap();

    let report = orch.execute_plan(&id).await.unwrap();
    assert_eq!(report.stats.failed, 3);
    assert_eq!(report.stats.completed, 1);

    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    // Only the doomed root ever ran; its dependents failed without starting.
    assert!(plan.tasks[1].started_at.is_none());
    assert!(plan.tasks[2].started_at.is_none());
    assert_eq!(plan.tasks[1].status, TaskStatus::Failed);
    assert_eq!(plan.tasks[3].status, TaskStatus::Completed);
    // Two real runs: the doomed root and the unrelated step.
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unlinked_validation_task_can_run_in_first_wave() {
    // The generated validation task has no dependencies by default, so in
    // parallel mode nothing stops it from running alongside the work it
    // validates.
    let orch = orchestrator(
        GaugeModel::new(),
        RecordingTools::new(),
        parallel_settings(4),
    );
    let id = session("unlinked");

    let report = orch
        .process_request(
            &id,
            "create the module",
            ensemble::RequestMode::Plan,
        )
        .await
        .unwrap();
    assert_eq!(report.stats.completed, 2);

    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    let validation = plan.tasks.last().unwrap();
    assert!(validation.dependencies.is_empty());
}

#[tokio::test]
async fn test_linked_validation_task_runs_last() {
    let mut settings = parallel_settings(4);
    settings.link_validation_task = true;
    let orch = orchestrator(GaugeModel::new(), RecordingTools::new(), settings);
    let id = session("linked");

    orch.process_request(&id, "create and test the module", ensemble::RequestMode::Plan)
        .await
        .unwrap();

    let plan = orch.get_context(&id).await.unwrap().current_plan.unwrap();
    let validation = plan.tasks.last().unwrap();
    assert_eq!(validation.dependencies.len(), plan.tasks.len() - 1);

    let validation_start = validation.started_at.unwrap();
    for task in &plan.tasks[..plan.tasks.len() - 1] {
        assert!(task.completed_at.unwrap() <= validation_start);
    }
}
