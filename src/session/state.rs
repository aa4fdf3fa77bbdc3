//! Per-session state record.

use super::phase::{Phase, PhaseError};
use crate::types::{
    AnalysisPlan, DataFrame, DatasetProfile, DatasetSummaryReport, DomainClassification,
    DriverScore, ExecutionResult, FinalAnalysisAnswer, Hypothesis, Metrics,
    MissingValueSolution, MissingValueTreatmentResult, ParsedIntent, StatisticalResultBundle,
    TargetType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a session owns. Outputs of a stage are only populated once its phase is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub phase: Phase,
    pub file_name: Option<String>,
    #[serde(skip)]
    pub dataframe: Option<DataFrame>,
    pub profile: Option<DatasetProfile>,

    // Preparation
    pub domain_classification: Option<DomainClassification>,
    pub dataset_summary: Option<DatasetSummaryReport>,
    pub missing_value_solutions: Vec<MissingValueSolution>,
    pub last_missing_treatment: Option<MissingValueTreatmentResult>,

    // Intent
    pub user_intent: Option<String>,
    pub parsed_intent: Option<ParsedIntent>,
    pub target_candidates: Vec<String>,
    pub target_column: Option<String>,
    pub target_type: Option<TargetType>,

    // Investigation outputs
    pub hypotheses: Vec<Hypothesis>,
    pub statistical_results: Option<StatisticalResultBundle>,
    pub driver_ranking: Vec<DriverScore>,
    pub final_answer: Option<FinalAnalysisAnswer>,

    // Plan outputs
    pub analysis_plan: Option<AnalysisPlan>,
    pub execution_results: Vec<ExecutionResult>,
    pub last_cleaning: Option<Metrics>,

    pub conversation: Vec<ConversationMessage>,
    pub errors: Vec<String>,
    /// Bumped on every plan approval; a run whose generation no longer matches is stale
    pub run_generation: u64,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            phase: Phase::Landing,
            file_name: None,
            dataframe: None,
            profile: None,
            domain_classification: None,
            dataset_summary: None,
            missing_value_solutions: Vec::new(),
            last_missing_treatment: None,
            user_intent: None,
            parsed_intent: None,
            target_candidates: Vec::new(),
            target_column: None,
            target_type: None,
            hypotheses: Vec::new(),
            statistical_results: None,
            driver_ranking: Vec::new(),
            final_answer: None,
            analysis_plan: None,
            execution_results: Vec::new(),
            last_cleaning: None,
            conversation: Vec::new(),
            errors: Vec::new(),
            run_generation: 0,
            created_at: Utc::now(),
        }
    }

    pub fn advance(&mut self, next: Phase) -> Result<(), PhaseError> {
        self.phase = self.phase.advance(next)?;
        Ok(())
    }

    /// Moves back to `target`, discarding plan and investigation outputs below EXECUTING.
    pub fn rewind(&mut self, target: Phase) -> Result<(), PhaseError> {
        self.phase = self.phase.rewind_to(target)?;
        if target.clears_outputs() {
            self.clear_outputs();
        }
        Ok(())
    }

    pub fn clear_outputs(&mut self) {
        self.execution_results.clear();
        self.hypotheses.clear();
        self.statistical_results = None;
        self.driver_ranking.clear();
        self.final_answer = None;
    }

    pub fn require_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<(), PhaseError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(PhaseError::OperationNotAllowed {
                operation,
                phase: self.phase,
            })
        }
    }

    pub fn say(&mut self, role: Role, content: impl Into<String>) {
        self.conversation.push(ConversationMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }
}
