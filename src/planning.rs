//! Intent parsing and analysis planning boundaries.
//!
//! Both are async traits so that model-backed implementations can sit behind them. The
//! keyword parser and rule planner are the deterministic defaults.

use crate::types::{
    AnalysisPlan, DatasetProfile, IntentType, OperationType, ParsedIntent, PlanStep,
};
use async_trait::async_trait;
use serde_json::json;

const CLEANING_KEYWORDS: [&str; 4] = ["clean", "missing", "duplicate", "outlier"];
const PREDICTIVE_KEYWORDS: [&str; 5] = ["predict", "forecast", "model", "classification", "regression"];
const DIAGNOSTIC_KEYWORDS: [&str; 6] = ["why", "cause", "driver", "correl", "variance", "compare"];

#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn parse(&self, text: &str, profile: &DatasetProfile) -> ParsedIntent;

    fn name(&self) -> &'static str;
}

/// Keyword-driven parser. Target candidates are profile columns named in the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentParser;

impl KeywordIntentParser {
    pub fn classify(text: &str) -> (IntentType, &'static str) {
        let lowered = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lowered.contains(w));
        if has(&CLEANING_KEYWORDS) {
            (IntentType::DataCleaning, "Detected cleaning keywords in user intent.")
        } else if has(&PREDICTIVE_KEYWORDS) {
            (IntentType::Predictive, "Detected predictive modeling keywords in user intent.")
        } else if has(&DIAGNOSTIC_KEYWORDS) {
            (IntentType::Diagnostic, "Detected diagnostic/causal investigation keywords.")
        } else {
            (
                IntentType::Descriptive,
                "Defaulted to descriptive intent based on generic exploration phrasing.",
            )
        }
    }
}

#[async_trait]
impl IntentParser for KeywordIntentParser {
    async fn parse(&self, text: &str, profile: &DatasetProfile) -> ParsedIntent {
        let lowered = text.to_lowercase();
        let (intent_type, reasoning) = Self::classify(text);
        let target_candidates = profile
            .column_names()
            .into_iter()
            .filter(|c| lowered.contains(&c.to_lowercase()))
            .collect();
        ParsedIntent {
            intent_type,
            target_candidates,
            requires_target: !matches!(intent_type, IntentType::Descriptive | IntentType::DataCleaning),
            reasoning: reasoning.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[async_trait]
pub trait AnalysisPlanner: Send + Sync {
    async fn plan(&self, intent: &ParsedIntent, profile: &DatasetProfile) -> AnalysisPlan;

    fn name(&self) -> &'static str;
}

/// Fixed plan templates per intent type.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulePlanner;

impl RulePlanner {
    fn segment_step(step_id: &str, description: &str, profile: &DatasetProfile) -> Option<PlanStep> {
        let group_by = profile.categorical_columns.first()?;
        let target = profile.numeric_columns.first()?;
        Some(
            PlanStep::new(step_id, description, OperationType::Groupby)
                .with_param("group_by", group_by.as_str())
                .with_param("target_column", target.as_str())
                .with_param("agg", "mean"),
        )
    }

    pub fn build(intent: &ParsedIntent, profile: &DatasetProfile) -> AnalysisPlan {
        let mut steps = Vec::new();
        match intent.intent_type {
            IntentType::Descriptive => {
                steps.push(PlanStep::new(
                    "step_1",
                    "Generate dataset summary statistics.",
                    OperationType::Summary,
                ));
                steps.extend(Self::segment_step(
                    "step_2",
                    "Compare numeric outcome by primary category.",
                    profile,
                ));
                if let Some(dt) = profile.datetime_columns.first() {
                    steps.push(
                        PlanStep::new(
                            "step_3",
                            "Assess time trend for primary numeric metric.",
                            OperationType::Trend,
                        )
                        .with_param("datetime_column", dt.as_str())
                        .with_param("target_column", json!(profile.numeric_columns.first())),
                    );
                }
            }
            IntentType::Diagnostic => {
                steps.push(PlanStep::new("step_1", "Generate baseline summary.", OperationType::Summary));
                steps.extend(Self::segment_step("step_2", "Run segment comparison by category.", profile));
                steps.push(PlanStep::new(
                    "step_3",
                    "Compute numeric correlation matrix.",
                    OperationType::Correlation,
                ));
            }
            IntentType::Predictive | IntentType::Explanatory => {
                let target = intent
                    .target_candidates
                    .first()
                    .or_else(|| profile.numeric_columns.last())
                    .or_else(|| profile.categorical_columns.last());
                steps.push(
                    PlanStep::new("step_1", "Train baseline predictive model.", OperationType::TrainModel)
                        .with_param("target_column", json!(target)),
                );
                steps.push(PlanStep::new(
                    "step_2",
                    "Evaluate baseline predictive model.",
                    OperationType::EvaluateModel,
                ));
            }
            IntentType::DataCleaning => {
                steps.push(
                    PlanStep::new(
                        "step_1",
                        "Apply cleaning operations for missing/duplicates/outliers.",
                        OperationType::CleanData,
                    )
                    .with_param(
                        "operations",
                        json!(["drop_duplicates", "fill_numeric_median", "fill_categorical_mode"]),
                    ),
                );
                steps.push(PlanStep::new("step_2", "Summarize cleaned dataset.", OperationType::Summary));
            }
        }
        AnalysisPlan {
            intent_type: intent.intent_type,
            steps,
        }
    }
}

#[async_trait]
impl AnalysisPlanner for RulePlanner {
    async fn plan(&self, intent: &ParsedIntent, profile: &DatasetProfile) -> AnalysisPlan {
        Self::build(intent, profile)
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}
