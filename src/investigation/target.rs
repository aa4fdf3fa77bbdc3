//! Target column typing and candidate suggestion.

use crate::stats::descriptive::std_dev;
use crate::types::{Column, DataFrame, TargetType};

/// Column-name fragments that usually mark an outcome column.
const TARGET_KEYWORDS: [&str; 11] = [
    "status", "approved", "default", "churn", "label", "outcome", "revenue", "income", "score",
    "amount", "risk",
];

/// Numeric targets with more than `cardinality` distinct values are regression targets;
/// everything else (including all non-numeric columns) is classification.
pub fn infer_target_type(column: &Column, cardinality: usize) -> TargetType {
    if column.is_numeric() && column.unique_count() > cardinality {
        TargetType::Regression
    } else {
        TargetType::Classification
    }
}

/// Plausible target columns, in column order, de-duplicated and capped at `limit`.
///
/// A column qualifies when its name contains an outcome keyword, when it is text with 2-6
/// distinct values, when it is numeric with at most 10 distinct values, or when it is
/// numeric with spread and at least max(20, 5% of rows) distinct values.
pub fn suggest_target_candidates(frame: &DataFrame, limit: usize) -> Vec<String> {
    let rows = frame.row_count();
    let high_variety = 20usize.max((rows as f64 * 0.05).ceil() as usize);

    let mut out: Vec<String> = Vec::new();
    for column in frame.columns() {
        if out.len() >= limit {
            break;
        }
        let lowered = column.name.to_lowercase();
        let unique = column.unique_count();

        let keyword = TARGET_KEYWORDS.iter().any(|k| lowered.contains(k));
        let shape = if column.is_numeric() {
            let values: Vec<f64> = column.parse_numeric().into_iter().flatten().collect();
            let spread = std_dev(&values).is_some_and(|s| s > 0.0);
            unique <= 10 || (spread && unique >= high_variety)
        } else {
            (2..=6).contains(&unique)
        };

        if (keyword || shape) && !out.contains(&column.name) {
            out.push(column.name.clone());
        }
    }
    out
}

/// Explicit candidates that exist in the frame, in the given order.
pub fn resolve_explicit_target(frame: &DataFrame, candidates: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for c in candidates {
        if frame.has_column(c) && !found.contains(c) {
            found.push(c.clone());
        }
    }
    found
}
