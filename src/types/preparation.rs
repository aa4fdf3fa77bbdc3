//! Data preparation types: DomainClassification, DatasetSummaryReport, missing-value
//! solutions and treatment results

use serde::{Deserialize, Serialize};

/// What kind of dataset this looks like, inferred from the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainClassification {
    pub domain_label: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub suggested_kpis: Vec<String>,
}

/// Narrative overview of a profiled dataset shown before the first question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummaryReport {
    pub executive_summary: String,
    pub data_health_assessment: String,
    pub statistical_highlights: Vec<String>,
    pub anomaly_indicators: Vec<String>,
    pub recommended_starting_points: Vec<String>,
    /// Only filled once the dataset has no missing values left
    pub important_features: Vec<String>,
    /// Only filled once the dataset has no missing values left
    pub useful_statistics: Vec<String>,
    pub confidence: f64,
}

// ============================================================================
// Missing-value treatment
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingValueAction {
    /// Median for metrics, mode for dimensions and text, forward/backward fill for dates
    SmartImpute,
    DropHighMissingColumns,
    FillNumericMedian,
    FillCategoricalMode,
    FillDatetimeFfill,
}

impl MissingValueAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmartImpute => "SMART_IMPUTE",
            Self::DropHighMissingColumns => "DROP_HIGH_MISSING_COLUMNS",
            Self::FillNumericMedian => "FILL_NUMERIC_MEDIAN",
            Self::FillCategoricalMode => "FILL_CATEGORICAL_MODE",
            Self::FillDatetimeFfill => "FILL_DATETIME_FFILL",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::SmartImpute => "Smart Imputation (Recommended)",
            Self::DropHighMissingColumns => "Drop High-Missing Columns",
            Self::FillNumericMedian => "Fill Numeric with Median",
            Self::FillCategoricalMode => "Fill Categorical/Text with Mode",
            Self::FillDatetimeFfill => "Fill Datetime with Forward/Backward Fill",
        }
    }
}

impl std::fmt::Display for MissingValueAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One treatment the user can pick; `solution_id` is the action name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueSolution {
    pub solution_id: String,
    pub title: String,
    pub description: String,
    pub action: MissingValueAction,
    pub target_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueTreatmentResult {
    pub solution_id: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub missing_before: usize,
    pub missing_after: usize,
    pub affected_columns: Vec<String>,
    pub summary: String,
}
