//! Execution Engine Tests
//!
//! Runs whole analysis plans through `ExecutionEngine` and checks failure isolation,
//! step chaining through the model context and the progress event stream.

use insight_studio::types::IntentType;
use insight_studio::{
    AnalysisPlan, ChannelSink, Column, DataFrame, DatasetProfiler, ExecutionEngine,
    InvestigationRequest, NoOpSink, OperationType, PlanStep, ProgressEvent, StepStatus,
};
use serde_json::json;

// ============================================================================
// Fixtures
// ============================================================================

fn abc_frame() -> DataFrame {
    DataFrame::new(vec![
        Column::from_f64("a", &[1.0, 2.0, 3.0, 4.0, 5.0]),
        Column::from_f64("b", &[2.0, 4.0, 6.0, 8.0, 10.0]),
        Column::from_f64("c", &[5.0, 3.0, 1.0, 9.0, 2.0]),
    ])
    .expect("valid frame")
}

/// 40 rows where `churn` follows `tenure` and `plan` is a weak categorical feature.
fn churn_frame() -> DataFrame {
    let n = 40;
    let tenure: Vec<f64> = (0..n).map(|i| f64::from(i) * 0.75 + 0.3).collect();
    let churn: Vec<&str> = (0..n).map(|i| if i < 20 { "yes" } else { "no" }).collect();
    let plan: Vec<&str> = (0..n).map(|i| ["basic", "pro"][(i % 2) as usize]).collect();
    let spend: Vec<Option<f64>> = (0..n)
        .map(|i| if i == 7 { None } else { Some(f64::from(i % 9) + 10.5) })
        .collect();
    DataFrame::new(vec![
        Column::from_f64("tenure", &tenure),
        Column::from_strs("churn", &churn),
        Column::from_strs("plan", &plan),
        Column::numeric("spend", spend),
    ])
    .expect("valid frame")
}

fn plan(intent_type: IntentType, steps: Vec<PlanStep>) -> AnalysisPlan {
    AnalysisPlan { intent_type, steps }
}

// ============================================================================
// Plans
// ============================================================================

#[tokio::test]
async fn correlation_reports_strongest_pair() {
    let plan = plan(
        IntentType::Diagnostic,
        vec![PlanStep::new("step_1", "corr", OperationType::Correlation)],
    );
    let outcome = ExecutionEngine::default()
        .execute(&plan, &abc_frame(), &NoOpSink, None)
        .await
        .expect("plan runs");

    let metrics = outcome.results[0].metrics.as_ref().expect("metrics present");
    assert_eq!(metrics["strongest_pair"], json!(["a", "b"]));
    let value = metrics["strongest_value"].as_f64().expect("numeric value");
    assert!((value - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn one_failing_step_leaves_others_untouched() {
    let steps = vec![
        PlanStep::new("step_1", "summary", OperationType::Summary),
        PlanStep::new("step_2", "segment", OperationType::Groupby)
            .with_param("group_by", "missing_column")
            .with_param("target_column", "a"),
        PlanStep::new("step_3", "corr", OperationType::Correlation),
    ];
    let frame = abc_frame();
    let engine = ExecutionEngine::default();

    let mixed = engine
        .execute(&plan(IntentType::Diagnostic, steps.clone()), &frame, &NoOpSink, None)
        .await
        .expect("plan runs");
    assert_eq!(mixed.results.len(), 3);
    assert_eq!(mixed.failed_steps(), 1);
    assert_eq!(mixed.results[1].status, StepStatus::Failed);
    assert!(mixed.results[1].result_summary.starts_with("GROUPBY failed:"));

    let clean = engine
        .execute(
            &plan(IntentType::Diagnostic, vec![steps[0].clone(), steps[2].clone()]),
            &frame,
            &NoOpSink,
            None,
        )
        .await
        .expect("plan runs");
    assert_eq!(mixed.results[0], clean.results[0]);
    assert_eq!(mixed.results[2].metrics, clean.results[1].metrics);
}

#[tokio::test]
async fn train_on_missing_target_fails_and_evaluate_follows() {
    let plan = plan(
        IntentType::Predictive,
        vec![
            PlanStep::new("step_1", "train", OperationType::TrainModel)
                .with_param("target_column", "does_not_exist"),
            PlanStep::new("step_2", "evaluate", OperationType::EvaluateModel),
        ],
    );
    let outcome = ExecutionEngine::default()
        .execute(&plan, &churn_frame(), &NoOpSink, None)
        .await
        .expect("plan runs");

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.status == StepStatus::Failed));
    assert!(outcome.results[1].result_summary.starts_with("EVALUATE_MODEL failed:"));
}

#[tokio::test]
async fn train_then_evaluate_classification() {
    let plan = plan(
        IntentType::Predictive,
        vec![
            PlanStep::new("step_1", "train", OperationType::TrainModel)
                .with_param("target_column", "churn"),
            PlanStep::new("step_2", "evaluate", OperationType::EvaluateModel),
        ],
    );
    let outcome = ExecutionEngine::default()
        .execute(&plan, &churn_frame(), &NoOpSink, None)
        .await
        .expect("plan runs");

    assert_eq!(outcome.failed_steps(), 0);
    let train = outcome.results[0].metrics.as_ref().expect("train metrics");
    assert_eq!(train["task_type"], json!("classification"));
    // row 7 has a missing numeric feature and is dropped
    assert_eq!(train["train_rows"], json!(31));
    assert_eq!(train["test_rows"], json!(8));

    let eval = outcome.results[1].metrics.as_ref().expect("eval metrics");
    let accuracy = eval["accuracy"].as_f64().expect("accuracy");
    assert!((0.0..=1.0).contains(&accuracy));
}

#[tokio::test]
async fn clean_data_feeds_later_steps() {
    let frame = DataFrame::new(vec![
        Column::numeric("x", vec![Some(1.0), Some(1.0), None, Some(4.0)]),
        Column::categorical(
            "g",
            vec![Some("a".into()), Some("a".into()), Some("b".into()), None],
        ),
    ])
    .expect("valid frame");
    let plan = plan(
        IntentType::DataCleaning,
        vec![
            PlanStep::new("step_1", "clean", OperationType::CleanData),
            PlanStep::new("step_2", "summary", OperationType::Summary),
        ],
    );
    let outcome = ExecutionEngine::default()
        .execute(&plan, &frame, &NoOpSink, None)
        .await
        .expect("plan runs");

    let clean = outcome.results[0].metrics.as_ref().expect("clean metrics");
    assert_eq!(clean["duplicates_removed"], json!(1));
    assert_eq!(clean["missing_after"], json!(0));
    assert_eq!(outcome.working_frame.row_count(), 3);
    assert_eq!(outcome.working_frame.total_missing(), 0);

    let summary = outcome.results[1].metrics.as_ref().expect("summary metrics");
    assert_eq!(summary["rows"], json!(3));
}

// ============================================================================
// Progress events
// ============================================================================

#[tokio::test]
async fn driver_analysis_runs_after_plan() {
    let frame = churn_frame();
    let request = InvestigationRequest {
        profile: DatasetProfiler::new().profile(&frame),
        target_column: "churn".to_string(),
        question: "Why do customers churn?".to_string(),
    };
    let plan = plan(
        IntentType::Diagnostic,
        vec![PlanStep::new("step_1", "summary", OperationType::Summary)],
    );
    let (sink, mut rx) = ChannelSink::channel();
    let outcome = ExecutionEngine::default()
        .execute(&plan, &frame, &sink, Some(&request))
        .await
        .expect("plan runs");
    drop(sink);

    assert_eq!(outcome.results.len(), 1);
    let report = outcome.investigation.expect("driver analysis report");
    assert_eq!(report.drivers[0].feature, "tenure");

    let mut ids = Vec::new();
    while let Some(event) = rx.recv().await {
        ids.push((event.step_id().map(str::to_string), matches!(event, ProgressEvent::StepStarted { .. })));
    }
    assert_eq!(
        ids,
        vec![
            (Some("step_1".to_string()), true),
            (Some("step_1".to_string()), false),
            (Some("driver_analysis".to_string()), true),
            (Some("driver_analysis".to_string()), false),
        ]
    );
}

#[test]
fn progress_event_wire_format() {
    let event = ProgressEvent::StepFailed {
        step_id: "step_2".into(),
        error: "boom".into(),
    };
    assert_eq!(
        serde_json::to_value(&event).expect("serializable"),
        json!({"type": "step_failed", "payload": {"step_id": "step_2", "error": "boom"}})
    );
}
