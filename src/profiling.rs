//! Column-role profiling.
//!
//! Roles are assigned by the first matching rule:
//! 1. every value distinct (integer or text columns only) → IDENTIFIER
//! 2. name contains `id`, `uuid`, `key` or `code` → IDENTIFIER
//! 3. text where at least 80% of the values parse as dates → DATETIME
//! 4. text holding exactly the values true/false → BOOLEAN
//! 5. numeric with fewer than 10 distinct values → CATEGORICAL_DIMENSION
//! 6. numeric → NUMERIC_METRIC
//! 7. text with fewer than 50 distinct values → CATEGORICAL_DIMENSION
//! 8. otherwise → TEXT

use crate::stats::descriptive::{max, mean, min, round_to, std_dev};
use crate::types::{
    parse_date, Column, ColumnData, ColumnRole, ColumnSummary, DataFrame, DatasetProfile,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const IDENTIFIER_NAME_HINTS: [&str; 4] = ["id", "uuid", "key", "code"];
const DATETIME_RATIO: f64 = 0.8;
const NUMERIC_CATEGORY_LIMIT: usize = 10;
const TEXT_CATEGORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetProfiler;

impl DatasetProfiler {
    pub fn new() -> Self {
        Self
    }

    fn is_identifier_name(name: &str) -> bool {
        let normalized = name.to_lowercase().replace(' ', "_");
        IDENTIFIER_NAME_HINTS.iter().any(|h| normalized.contains(h))
    }

    fn looks_like_datetime(column: &Column) -> bool {
        let ColumnData::Categorical(values) = &column.data else {
            return false;
        };
        let present: Vec<&str> = values.iter().flatten().map(String::as_str).collect();
        if present.is_empty() {
            return false;
        }
        let parsed = present.iter().filter(|v| parse_date(v).is_some()).count();
        parsed as f64 / present.len() as f64 >= DATETIME_RATIO
    }

    fn looks_like_boolean(column: &Column) -> bool {
        let ColumnData::Categorical(values) = &column.data else {
            return false;
        };
        let distinct: BTreeSet<String> = values.iter().flatten().map(|v| v.trim().to_lowercase()).collect();
        !distinct.is_empty() && distinct.iter().all(|v| v == "true" || v == "false")
    }

    /// Continuous measurements are never identifiers, even when every value is distinct.
    fn may_be_identifier(column: &Column) -> bool {
        match &column.data {
            ColumnData::Numeric(values) => values.iter().flatten().all(|v| v.fract() == 0.0),
            ColumnData::Categorical(_) => true,
        }
    }

    pub fn role_of(column: &Column, total_rows: usize) -> ColumnRole {
        let unique = column.unique_count();
        if total_rows > 0 && unique == total_rows && Self::may_be_identifier(column) {
            return ColumnRole::Identifier;
        }
        if Self::is_identifier_name(&column.name) {
            return ColumnRole::Identifier;
        }
        if Self::looks_like_datetime(column) {
            return ColumnRole::Datetime;
        }
        if Self::looks_like_boolean(column) {
            return ColumnRole::Boolean;
        }
        if column.is_numeric() {
            if unique < NUMERIC_CATEGORY_LIMIT {
                ColumnRole::CategoricalDimension
            } else {
                ColumnRole::NumericMetric
            }
        } else if unique < TEXT_CATEGORY_LIMIT {
            ColumnRole::CategoricalDimension
        } else {
            ColumnRole::Text
        }
    }

    fn summarize(column: &Column, role: ColumnRole) -> ColumnSummary {
        if role == ColumnRole::NumericMetric {
            let values: Vec<f64> = column.parse_numeric().into_iter().flatten().collect();
            return ColumnSummary::Numeric {
                mean: mean(&values),
                std: std_dev(&values),
                min: min(&values),
                max: max(&values),
            };
        }
        let (top, frequency) = column.mode().map_or((None, 0), |(t, f)| (Some(t), f));
        ColumnSummary::Categorical {
            unique: column.unique_count(),
            top,
            frequency,
        }
    }

    pub fn profile(&self, frame: &DataFrame) -> DatasetProfile {
        let total_rows = frame.row_count();

        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();
        let mut datetime_columns = Vec::new();
        let mut column_roles = BTreeMap::new();
        let mut column_summary = BTreeMap::new();
        let mut missing_percentage = BTreeMap::new();
        let mut potential_primary_keys = Vec::new();

        for column in frame.columns() {
            let role = Self::role_of(column, total_rows);
            match role {
                ColumnRole::NumericMetric => numeric_columns.push(column.name.clone()),
                ColumnRole::CategoricalDimension | ColumnRole::Boolean => {
                    categorical_columns.push(column.name.clone());
                }
                ColumnRole::Datetime => datetime_columns.push(column.name.clone()),
                ColumnRole::Identifier | ColumnRole::Text => {}
            }

            let missing = column.missing_count();
            let pct = if total_rows == 0 {
                0.0
            } else {
                round_to(missing as f64 / total_rows as f64 * 100.0, 2)
            };
            missing_percentage.insert(column.name.clone(), pct);

            if total_rows > 0 && missing == 0 && column.unique_count() == total_rows {
                potential_primary_keys.push(column.name.clone());
            }

            column_summary.insert(column.name.clone(), Self::summarize(column, role));
            column_roles.insert(column.name.clone(), role);
        }

        let profile = DatasetProfile {
            total_rows,
            total_columns: frame.column_count(),
            numeric_columns,
            categorical_columns,
            datetime_columns,
            missing_percentage,
            duplicate_rows: frame.duplicate_row_count(),
            potential_primary_keys,
            column_roles,
            column_summary,
        };
        debug!(
            rows = profile.total_rows,
            columns = profile.total_columns,
            numeric = profile.numeric_columns.len(),
            categorical = profile.categorical_columns.len(),
            datetime = profile.datetime_columns.len(),
            "Dataset profiled"
        );
        profile
    }
}
