//! Investigation Pipeline Tests
//!
//! Runs the selector, importance aggregator and ranking engine end to end on small
//! synthetic datasets with known structure.

use insight_studio::investigation::InvestigationEngine;
use insight_studio::{
    Column, DataFrame, DatasetProfiler, SignificanceLabel, StudioError, TargetType, TestType,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Offsets with mean 0 and standard deviation 1.
fn unit_offset(i: usize) -> f64 {
    ((i % 7) as f64 - 3.0) / 2.0
}

/// 50 "no" rows around 10 and 50 "yes" rows around 20, plus a weak categorical feature.
fn separated_classes() -> DataFrame {
    let mut spend = Vec::with_capacity(100);
    let mut approved = Vec::with_capacity(100);
    let mut region = Vec::with_capacity(100);
    for i in 0..100 {
        let yes = i >= 50;
        spend.push((if yes { 20.0 } else { 10.0 }) + unit_offset(i));
        approved.push(if yes { "yes" } else { "no" });
        region.push(["north", "south", "east"][i % 3]);
    }
    DataFrame::new(vec![
        Column::from_f64("spend", &spend),
        Column::from_strs("approved", &approved),
        Column::from_strs("region", &region),
    ])
    .expect("valid frame")
}

/// Regression target driven by `price`, with `noise` unrelated.
fn regression_frame() -> DataFrame {
    let n = 60;
    let price: Vec<f64> = (0..n).map(|i| i as f64 * 1.25 + 0.5).collect();
    let noise: Vec<f64> = (0..n).map(|i| ((i * 37) % 11) as f64 + 0.5).collect();
    let revenue: Vec<f64> = price
        .iter()
        .enumerate()
        .map(|(i, p)| 3.0 * p + unit_offset(i) + 0.1)
        .collect();
    DataFrame::new(vec![
        Column::from_f64("price", &price),
        Column::from_f64("noise", &noise),
        Column::from_f64("revenue", &revenue),
    ])
    .expect("valid frame")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn separated_classes_give_strong_mann_whitney_driver() {
    let frame = separated_classes();
    let profile = DatasetProfiler::new().profile(&frame);
    let report = InvestigationEngine::default()
        .investigate(&frame, &profile, "approved", "Why are loans approved?")
        .expect("investigation succeeds");

    assert_eq!(report.target_type, TargetType::Classification);
    let spend = report
        .bundle
        .results
        .iter()
        .find(|r| r.feature == "spend")
        .expect("spend tested");
    assert_eq!(spend.test_type, TestType::MannWhitneyU);
    assert!(spend.p_value.is_some_and(|p| p < 0.01));
    assert!(spend.effect_size.is_some_and(|d| d.abs() > 1.0));

    let top = &report.drivers[0];
    assert_eq!(top.feature, "spend");
    assert_eq!(top.statistical_significance, SignificanceLabel::Strong);
    assert!(!report.answer.direct_answer.is_empty());
}

#[test]
fn regression_target_ranks_real_driver_first() {
    let frame = regression_frame();
    let profile = DatasetProfiler::new().profile(&frame);
    let report = InvestigationEngine::default()
        .investigate(&frame, &profile, "revenue", "What drives revenue?")
        .expect("investigation succeeds");

    assert_eq!(report.target_type, TargetType::Regression);
    assert_eq!(report.drivers[0].feature, "price");
    let price = report
        .bundle
        .results
        .iter()
        .find(|r| r.feature == "price")
        .expect("price tested");
    assert_eq!(price.test_type, TestType::PearsonSpearman);
    assert!(price.correlation.is_some_and(|r| r > 0.95));
}

#[test]
fn ranking_is_dense_bounded_and_idempotent() {
    let frame = separated_classes();
    let profile = DatasetProfiler::new().profile(&frame);
    let engine = InvestigationEngine::default();
    let report = engine
        .investigate(&frame, &profile, "approved", "Why?")
        .expect("investigation succeeds");

    let mut ranks: Vec<usize> = report.drivers.iter().map(|d| d.importance_rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, (1..=report.drivers.len()).collect::<Vec<_>>());
    assert!(report
        .drivers
        .iter()
        .all(|d| (0.0..=1.0).contains(&d.strength_score)));

    let again = engine.ranking().rank(&report.bundle);
    assert_eq!(again, report.drivers);
}

#[test]
fn missing_target_is_run_fatal() {
    let frame = separated_classes();
    let profile = DatasetProfiler::new().profile(&frame);
    let err = InvestigationEngine::default()
        .investigate(&frame, &profile, "defaulted", "Why?")
        .unwrap_err();
    assert!(matches!(err, StudioError::TargetNotFound(ref c) if c == "defaulted"));
}

#[test]
fn too_few_rows_skip_every_feature() {
    let frame = DataFrame::new(vec![
        Column::from_f64("x", &[1.5, 2.5, 3.5, 4.5, 5.5]),
        Column::from_f64("y", &[2.0, 4.1, 5.9, 8.2, 9.9]),
    ])
    .expect("valid frame");
    let profile = DatasetProfiler::new().profile(&frame);
    let report = InvestigationEngine::default()
        .investigate(&frame, &profile, "y", "Why?")
        .expect("investigation succeeds");
    assert!(report.bundle.results.is_empty());
    assert!(report.drivers.is_empty());
    assert!(report
        .bundle
        .data_quality_flags
        .iter()
        .any(|f| f.contains("skipped by sample guards")));
}
