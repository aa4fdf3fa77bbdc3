//! Plan types: IntentType, ParsedIntent, OperationType, PlanStep, AnalysisPlan, ExecutionResult

use serde::{Deserialize, Serialize};

/// Free-form metric and parameter maps carried by plans and results.
pub type Metrics = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentType {
    Descriptive,
    Diagnostic,
    Predictive,
    Explanatory,
    DataCleaning,
}

impl IntentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Descriptive => "DESCRIPTIVE",
            Self::Diagnostic => "DIAGNOSTIC",
            Self::Predictive => "PREDICTIVE",
            Self::Explanatory => "EXPLANATORY",
            Self::DataCleaning => "DATA_CLEANING",
        }
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reading of a user question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub intent_type: IntentType,
    #[serde(default)]
    pub target_candidates: Vec<String>,
    #[serde(default = "default_requires_target")]
    pub requires_target: bool,
    pub reasoning: String,
}

fn default_requires_target() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Summary,
    Groupby,
    Correlation,
    Trend,
    TrainModel,
    EvaluateModel,
    CleanData,
}

impl OperationType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "SUMMARY",
            Self::Groupby => "GROUPBY",
            Self::Correlation => "CORRELATION",
            Self::Trend => "TREND",
            Self::TrainModel => "TRAIN_MODEL",
            Self::EvaluateModel => "EVALUATE_MODEL",
            Self::CleanData => "CLEAN_DATA",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed, parameterized operation of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_id: String,
    pub description: String,
    pub operation_type: OperationType,
    #[serde(default)]
    pub parameters: Metrics,
}

impl PlanStep {
    pub fn new(
        step_id: impl Into<String>,
        description: impl Into<String>,
        operation_type: OperationType,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            description: description.into(),
            operation_type,
            parameters: Metrics::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// String parameter, if present and a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPlan {
    pub intent_type: IntentType,
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Failed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        })
    }
}

/// Outcome of one executed plan step. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub step_id: String,
    pub status: StepStatus,
    pub result_summary: String,
    pub metrics: Option<Metrics>,
}

impl ExecutionResult {
    pub fn success(step_id: impl Into<String>, summary: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Success,
            result_summary: summary.into(),
            metrics: Some(metrics),
        }
    }

    pub fn failed(step_id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Failed,
            result_summary: summary.into(),
            metrics: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_deserializes_from_wire_names() {
        let raw = r#"{
            "intent_type": "DIAGNOSTIC",
            "steps": [
                {"step_id": "s1", "description": "group", "operation_type": "GROUPBY",
                 "parameters": {"group_by": "region", "target_column": "sales"}},
                {"step_id": "s2", "description": "train", "operation_type": "TRAIN_MODEL"}
            ]
        }"#;
        let plan: AnalysisPlan = serde_json::from_str(raw).unwrap();
        assert_eq!(plan.intent_type, IntentType::Diagnostic);
        assert_eq!(plan.steps[0].param_str("group_by"), Some("region"));
        assert_eq!(plan.steps[1].operation_type, OperationType::TrainModel);
        assert!(plan.steps[1].parameters.is_empty());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let r = ExecutionResult::failed("s1", "boom");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert!(json["metrics"].is_null());
    }
}
