//! Dataset profile types: ColumnRole, ColumnSummary, DatasetProfile

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic role assigned to each column by the profiler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    Identifier,
    NumericMetric,
    CategoricalDimension,
    Datetime,
    Boolean,
    Text,
}

impl ColumnRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "IDENTIFIER",
            Self::NumericMetric => "NUMERIC_METRIC",
            Self::CategoricalDimension => "CATEGORICAL_DIMENSION",
            Self::Datetime => "DATETIME",
            Self::Boolean => "BOOLEAN",
            Self::Text => "TEXT",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric {
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    },
    Categorical {
        unique: usize,
        top: Option<String>,
        frequency: usize,
    },
}

/// Structural profile of one dataset snapshot.
///
/// Produced once per frame; a cleaning operation replaces the frame and the profile with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub datetime_columns: Vec<String>,
    /// Missing share per column in percent, rounded to 2 dp
    pub missing_percentage: BTreeMap<String, f64>,
    pub duplicate_rows: usize,
    pub potential_primary_keys: Vec<String>,
    pub column_roles: BTreeMap<String, ColumnRole>,
    pub column_summary: BTreeMap<String, ColumnSummary>,
}

impl DatasetProfile {
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        self.column_roles.get(column).copied()
    }

    /// Column names in a stable order (sorted).
    pub fn column_names(&self) -> Vec<String> {
        self.column_roles.keys().cloned().collect()
    }
}
