//! Investigation types: Hypothesis, StatisticalFeatureResult, StatisticalResultBundle,
//! DriverScore, FinalAnalysisAnswer

use serde::{Deserialize, Serialize};

// ============================================================================
// Targets and Hypotheses
// ============================================================================

/// Learning task implied by the target column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Classification,
    Regression,
}

impl TargetType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisKind {
    Correlation,
    GroupDifference,
    ClassificationSignal,
}

/// Candidate relationship between a feature and the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub feature: String,
    #[serde(rename = "type")]
    pub kind: HypothesisKind,
    pub description: String,
}

// ============================================================================
// Statistical Results
// ============================================================================

/// Test run for one feature. Determines which result fields are populated:
///
/// | test | p_value | effect_size | correlation |
/// |---|---|---|---|
/// | `mann_whitney_u` | yes | \|Cohen's d\| | no |
/// | `anova` | yes | eta-squared | no |
/// | `chi_square` | yes | Cramér's V | no |
/// | `pearson_spearman` | yes (Pearson) | \|Pearson r\| | Spearman r |
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    MannWhitneyU,
    Anova,
    ChiSquare,
    PearsonSpearman,
}

impl TestType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MannWhitneyU => "mann_whitney_u",
            Self::Anova => "anova",
            Self::ChiSquare => "chi_square",
            Self::PearsonSpearman => "pearson_spearman",
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of testing one feature against the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatureResult {
    pub feature: String,
    pub test_type: TestType,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub correlation: Option<f64>,
    /// Filled in by the importance aggregator
    pub feature_importance: Option<f64>,
    pub confidence_score: f64,
}

/// Model used to produce feature importances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    RandomForestClassifier,
    RandomForestRegressor,
    None,
}

impl ModelType {
    pub const fn for_target(target_type: TargetType) -> Self {
        match target_type {
            TargetType::Classification => Self::RandomForestClassifier,
            TargetType::Regression => Self::RandomForestRegressor,
        }
    }
}

/// All statistical outputs of one investigation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalResultBundle {
    pub target_column: String,
    pub target_type: TargetType,
    pub model_type_used: ModelType,
    #[serde(default)]
    pub data_quality_flags: Vec<String>,
    #[serde(default)]
    pub results: Vec<StatisticalFeatureResult>,
}

// ============================================================================
// Ranking
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SignificanceLabel {
    Strong,
    Moderate,
    Weak,
    #[serde(rename = "No p-value")]
    NoPValue,
}

impl SignificanceLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Weak => "Weak",
            Self::NoPValue => "No p-value",
        }
    }
}

impl std::fmt::Display for SignificanceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked driver with the raw statistics it was scored from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverScore {
    pub feature: String,
    /// Normalized to [0, 1] against the strongest driver of the batch
    pub strength_score: f64,
    /// 1 = strongest
    pub importance_rank: usize,
    pub statistical_significance: SignificanceLabel,
    pub explanation_hint: String,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub feature_importance: Option<f64>,
    pub correlation: Option<f64>,
}

/// Natural-language answer to the user's question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnalysisAnswer {
    pub direct_answer: String,
    pub key_drivers_summary: String,
    #[serde(default)]
    pub evidence_points: Vec<String>,
    pub business_impact: String,
    pub confidence_score: f64,
    pub recommended_next_step: String,
}
