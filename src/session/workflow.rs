//! Studio workflow: the operations a conversational front end drives a session through.
//!
//! Every operation loads a snapshot from the store, checks the phase, mutates the snapshot and
//! writes it back. Phase checks happen before any mutation so a rejected call leaves the
//! stored record untouched.

use super::phase::{Phase, PhaseError};
use super::state::{Role, SessionState};
use super::store::SessionStore;
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::execution::operations::{clean_frame, CleaningOperation};
use crate::execution::{ExecutionEngine, InvestigationRequest, ProgressEvent, ProgressSink};
use crate::investigation::target::{resolve_explicit_target, suggest_target_candidates};
use crate::investigation::InvestigationEngine;
use crate::planning::{AnalysisPlanner, IntentParser, KeywordIntentParser, RulePlanner};
use crate::preparation::{
    dataset_opening, DatasetSummarizer, DomainClassifier, MissingValueTreatment,
    ProfileSummarizer, RoleDomainClassifier,
};
use crate::profiling::DatasetProfiler;
use crate::types::{DataFrame, StepStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_QUESTION: &str = "Investigate key drivers for the selected target.";
const NO_TARGET_MESSAGE: &str =
    "I could not infer a reliable outcome column. Please select the target column to analyze.";
/// Candidates listed in the clarification message.
const CANDIDATES_SHOWN: usize = 6;

enum DriverTarget {
    Resolved(InvestigationRequest),
    Unresolved(String),
    /// No intent or profile context; the pass is not attempted
    Unavailable,
}

pub struct Studio<S: SessionStore> {
    store: S,
    profiler: DatasetProfiler,
    parser: Arc<dyn IntentParser>,
    planner: Arc<dyn AnalysisPlanner>,
    domain_classifier: Arc<dyn DomainClassifier>,
    summarizer: Arc<dyn DatasetSummarizer>,
    missing_values: MissingValueTreatment,
    investigation: InvestigationEngine,
    execution: ExecutionEngine,
    max_target_candidates: usize,
}

impl<S: SessionStore> Studio<S> {
    pub fn new(store: S, cfg: &StudioConfig) -> Self {
        Self {
            store,
            profiler: DatasetProfiler::new(),
            parser: Arc::new(KeywordIntentParser),
            planner: Arc::new(RulePlanner),
            domain_classifier: Arc::new(RoleDomainClassifier),
            summarizer: Arc::new(ProfileSummarizer),
            missing_values: MissingValueTreatment::new(),
            investigation: InvestigationEngine::new(cfg),
            execution: ExecutionEngine::new(cfg),
            max_target_candidates: cfg.session.max_target_candidates,
        }
    }

    pub fn with_intent_parser(mut self, parser: Arc<dyn IntentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_planner(mut self, planner: Arc<dyn AnalysisPlanner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_domain_classifier(mut self, classifier: Arc<dyn DomainClassifier>) -> Self {
        self.domain_classifier = classifier;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn DatasetSummarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load(&self, session_id: &str) -> StudioResult<SessionState> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| StudioError::SessionNotFound(session_id.to_string()))
    }

    // ========================================================================
    // Data lifecycle
    // ========================================================================

    pub async fn create_session(&self) -> SessionState {
        let session_id = format!("{:016x}", rand::random::<u64>());
        let mut state = SessionState::new(session_id);
        state.say(Role::System, "Upload a dataset to begin.");
        info!(session_id = %state.session_id, "Session created");
        self.store.put(state.clone()).await;
        state
    }

    pub async fn upload(
        &self,
        session_id: &str,
        file_name: &str,
        frame: DataFrame,
    ) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("upload", &[Phase::Landing])?;
        if frame.column_count() == 0 {
            return Err(StudioError::MissingDataFrame);
        }

        state.say(
            Role::System,
            format!(
                "Loaded {file_name} with {} rows and {} columns.",
                frame.row_count(),
                frame.column_count()
            ),
        );
        state.file_name = Some(file_name.to_string());
        state.dataframe = Some(frame);
        state.advance(Phase::DataUploaded)?;

        info!(session_id = %session_id, file = %file_name, "Dataset uploaded");
        self.store.put(state.clone()).await;
        Ok(state)
    }

    pub async fn profile(&self, session_id: &str) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("profile", &[Phase::DataUploaded])?;
        let frame = state.dataframe.as_ref().ok_or(StudioError::MissingDataFrame)?;

        let profile = self.profiler.profile(frame);
        state.say(
            Role::Assistant,
            format!(
                "Profiled {} rows: {} numeric, {} categorical and {} datetime columns.",
                profile.total_rows,
                profile.numeric_columns.len(),
                profile.categorical_columns.len(),
                profile.datetime_columns.len()
            ),
        );
        state.profile = Some(profile);
        state.advance(Phase::ProfileReady)?;

        info!(session_id = %session_id, "Profile ready");
        self.store.put(state.clone()).await;
        Ok(state)
    }

    /// Classifies the dataset, writes its summary and offers missing-value solutions.
    pub async fn start_analysis(&self, session_id: &str) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("start_analysis", &[Phase::ProfileReady])?;
        let profile = state.profile.clone().ok_or(StudioError::MissingProfile)?;
        let column_names = state
            .dataframe
            .as_ref()
            .map(DataFrame::column_names)
            .unwrap_or_default();

        let domain = self.domain_classifier.classify(&profile, &column_names).await;
        let summary = self.summarizer.summarize(&profile, &domain, false).await;
        debug!(
            session_id = %session_id,
            classifier = self.domain_classifier.name(),
            summarizer = self.summarizer.name(),
            domain = %domain.domain_label,
            "Dataset summarized"
        );

        state.missing_value_solutions = self.missing_values.suggest(&profile);
        state.last_missing_treatment = None;
        state.say(
            Role::Assistant,
            format!("{} {}", dataset_opening(&profile), summary.executive_summary),
        );
        state.domain_classification = Some(domain);
        state.dataset_summary = Some(summary);
        state.advance(Phase::WaitingForIntent)?;

        info!(
            session_id = %session_id,
            missing_solutions = state.missing_value_solutions.len(),
            "Analysis started"
        );
        self.store.put(state.clone()).await;
        Ok(state)
    }

    /// Installs a treated frame: re-profiles it, recomputes missing-value solutions and
    /// refreshes the summary once a domain is known.
    async fn replace_frame(&self, state: &mut SessionState, frame: DataFrame) {
        let profile = self.profiler.profile(&frame);
        state.missing_value_solutions = self.missing_values.suggest(&profile);
        if let Some(domain) = state.domain_classification.as_ref() {
            let include_guidance = frame.total_missing() == 0;
            state.dataset_summary = Some(
                self.summarizer
                    .summarize(&profile, domain, include_guidance)
                    .await,
            );
        }
        state.dataframe = Some(frame);
        state.profile = Some(profile);
    }

    /// Replaces the dataset with a cleaned copy and re-profiles it.
    pub async fn apply_cleaning(
        &self,
        session_id: &str,
        operations: &[CleaningOperation],
    ) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("apply_cleaning", &[Phase::WaitingForIntent])?;
        let frame = state.dataframe.as_ref().ok_or(StudioError::MissingDataFrame)?;

        let (cleaned, metrics) =
            clean_frame(frame, operations).map_err(|e| StudioError::Validation(e.to_string()))?;
        state.say(
            Role::Assistant,
            format!(
                "Applied cleaning: {} rows and {} missing values remain.",
                cleaned.row_count(),
                cleaned.total_missing()
            ),
        );
        self.replace_frame(&mut state, cleaned).await;
        state.last_cleaning = Some(metrics);

        info!(session_id = %session_id, operations = operations.len(), "Cleaning applied");
        self.store.put(state.clone()).await;
        Ok(state)
    }

    /// Applies one of the offered missing-value solutions, by id.
    pub async fn apply_missing_solution(
        &self,
        session_id: &str,
        solution_id: &str,
    ) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("apply_missing_solution", &[Phase::WaitingForIntent])?;
        let frame = state.dataframe.as_ref().ok_or(StudioError::MissingDataFrame)?;
        let profile = state.profile.as_ref().ok_or(StudioError::MissingProfile)?;
        let solution = state
            .missing_value_solutions
            .iter()
            .find(|s| s.solution_id == solution_id)
            .ok_or_else(|| StudioError::SolutionNotFound(solution_id.to_string()))?;

        let (treated, result) = self.missing_values.apply(frame, profile, solution)?;
        state.say(Role::Assistant, result.summary.clone());
        info!(
            session_id = %session_id,
            solution = %solution_id,
            missing_before = result.missing_before,
            missing_after = result.missing_after,
            "Missing-value solution applied"
        );
        state.last_missing_treatment = Some(result);
        self.replace_frame(&mut state, treated).await;

        self.store.put(state.clone()).await;
        Ok(state)
    }

    // ========================================================================
    // Investigation branch
    // ========================================================================

    /// Parses a question and routes to investigation or target clarification.
    ///
    /// A fatal investigation error is recorded on the session, which falls back to
    /// WAITING_FOR_INTENT, and is returned to the caller.
    pub async fn submit_intent(&self, session_id: &str, text: &str) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("submit_intent", &[Phase::WaitingForIntent, Phase::AnswerReady])?;
        let profile = state.profile.clone().ok_or(StudioError::MissingProfile)?;
        let frame = state.dataframe.as_ref().ok_or(StudioError::MissingDataFrame)?;

        let intent = self.parser.parse(text, &profile).await;
        debug!(
            session_id = %session_id,
            parser = self.parser.name(),
            intent = %intent.intent_type,
            candidates = intent.target_candidates.len(),
            "Intent parsed"
        );

        let mut candidates = resolve_explicit_target(frame, &intent.target_candidates);
        if candidates.is_empty() {
            candidates = suggest_target_candidates(frame, self.max_target_candidates);
        }

        state.say(Role::User, text);
        state.user_intent = Some(text.to_string());
        state.parsed_intent = Some(intent);
        state.target_candidates = candidates.clone();
        state.target_column = None;
        state.target_type = None;
        state.advance(Phase::IntentParsed)?;

        if let [target] = candidates.as_slice() {
            return self.investigate(state, target.clone(), text.to_string()).await;
        }

        let message = if candidates.is_empty() {
            NO_TARGET_MESSAGE.to_string()
        } else {
            let shown: Vec<&str> = candidates
                .iter()
                .take(CANDIDATES_SHOWN)
                .map(String::as_str)
                .collect();
            format!(
                "I detected multiple possible outcome columns: {}. Which one should I analyze?",
                shown.join(", ")
            )
        };
        state.say(Role::Assistant, message);
        state.advance(Phase::TargetValidationRequired)?;

        info!(
            session_id = %session_id,
            candidates = state.target_candidates.len(),
            "Target confirmation required"
        );
        self.store.put(state.clone()).await;
        Ok(state)
    }

    pub async fn confirm_target(&self, session_id: &str, column: &str) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("confirm_target", &[Phase::TargetValidationRequired])?;
        let frame = state.dataframe.as_ref().ok_or(StudioError::MissingDataFrame)?;
        if !frame.has_column(column) {
            return Err(StudioError::TargetNotFound(column.to_string()));
        }

        state.say(Role::User, format!("Target confirmed: {column}"));
        let question = state
            .user_intent
            .clone()
            .unwrap_or_else(|| DEFAULT_QUESTION.to_string());
        self.investigate(state, column.to_string(), question).await
    }

    async fn investigate(
        &self,
        mut state: SessionState,
        target_column: String,
        question: String,
    ) -> StudioResult<SessionState> {
        state.advance(Phase::Investigating)?;
        state.target_column = Some(target_column.clone());

        let outcome = match (state.dataframe.as_ref(), state.profile.as_ref()) {
            (Some(frame), Some(profile)) => {
                self.investigation
                    .investigate(frame, profile, &target_column, &question)
            }
            (None, _) => Err(StudioError::MissingDataFrame),
            (_, None) => Err(StudioError::MissingProfile),
        };

        match outcome {
            Ok(report) => {
                state.target_type = Some(report.target_type);
                state.hypotheses = report.hypotheses;
                state.statistical_results = Some(report.bundle);
                state.driver_ranking = report.drivers;
                state.advance(Phase::DriverRanked)?;

                state.say(Role::Assistant, report.answer.direct_answer.clone());
                state.final_answer = Some(report.answer);
                state.advance(Phase::AnswerReady)?;

                info!(
                    session_id = %state.session_id,
                    target_column = %target_column,
                    drivers = state.driver_ranking.len(),
                    "Answer ready"
                );
                self.store.put(state.clone()).await;
                Ok(state)
            }
            Err(e) => {
                warn!(
                    session_id = %state.session_id,
                    target_column = %target_column,
                    error = %e,
                    "Investigation failed"
                );
                state.rewind(Phase::WaitingForIntent)?;
                state.errors.push(e.to_string());
                state.say(Role::Assistant, format!("Investigation failed: {e}"));
                self.store.put(state).await;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Plan branch
    // ========================================================================

    /// Builds a plan for `text`, or for the already-parsed intent when `text` is `None`.
    ///
    /// A new question drops any previously confirmed target.
    pub async fn submit_plan(&self, session_id: &str, text: Option<&str>) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase(
            "submit_plan",
            &[Phase::WaitingForIntent, Phase::IntentParsed, Phase::AnswerReady],
        )?;
        let profile = state.profile.clone().ok_or(StudioError::MissingProfile)?;

        let intent = match text {
            Some(text) => {
                state.say(Role::User, text);
                state.user_intent = Some(text.to_string());
                state.target_column = None;
                state.target_type = None;
                self.parser.parse(text, &profile).await
            }
            None => state
                .parsed_intent
                .clone()
                .ok_or_else(|| StudioError::Validation("no intent available to plan from".into()))?,
        };

        let plan = self.planner.plan(&intent, &profile).await;
        state.say(
            Role::Assistant,
            format!(
                "Prepared a {} plan with {} steps. Approve it to run.",
                plan.intent_type,
                plan.steps.len()
            ),
        );
        debug!(session_id = %session_id, planner = self.planner.name(), steps = plan.steps.len(), "Plan built");
        state.parsed_intent = Some(intent);
        state.analysis_plan = Some(plan);
        state.advance(Phase::PlanReady)?;

        self.store.put(state.clone()).await;
        Ok(state)
    }

    pub async fn approve_plan(&self, session_id: &str) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        state.require_phase("approve_plan", &[Phase::PlanReady])?;
        if state.analysis_plan.is_none() {
            return Err(StudioError::PlanMissing);
        }
        if state.dataframe.is_none() {
            return Err(StudioError::MissingDataFrame);
        }

        state.clear_outputs();
        state.run_generation += 1;
        state.advance(Phase::Executing)?;
        state.say(Role::User, "Plan approved.");

        info!(session_id = %session_id, generation = state.run_generation, "Plan approved");
        self.store.put(state.clone()).await;
        Ok(state)
    }

    /// Target for the driver-analysis pass after a plan.
    ///
    /// A confirmed target wins. Otherwise the parsed intent's explicit candidates are
    /// resolved against the frame, falling back to suggested candidates; exactly one must
    /// remain.
    fn driver_target(&self, state: &SessionState, frame: &DataFrame) -> DriverTarget {
        let Some(profile) = state.profile.as_ref() else {
            return DriverTarget::Unavailable;
        };
        let target_column = match (&state.target_column, &state.parsed_intent) {
            (Some(column), _) => column.clone(),
            (None, Some(intent)) => {
                let mut candidates = resolve_explicit_target(frame, &intent.target_candidates);
                if candidates.is_empty() {
                    candidates = suggest_target_candidates(frame, self.max_target_candidates);
                }
                match candidates.as_slice() {
                    [only] => only.clone(),
                    [] => {
                        return DriverTarget::Unresolved(
                            "no target column could be resolved for driver analysis".to_string(),
                        )
                    }
                    several => {
                        return DriverTarget::Unresolved(format!(
                            "several target columns match ({}); confirm one to run driver analysis",
                            several.join(", ")
                        ))
                    }
                }
            }
            (None, None) => return DriverTarget::Unavailable,
        };
        DriverTarget::Resolved(InvestigationRequest {
            profile: profile.clone(),
            target_column,
            question: state
                .user_intent
                .clone()
                .unwrap_or_else(|| DEFAULT_QUESTION.to_string()),
        })
    }

    async fn emit(sink: &dyn ProgressSink, event: ProgressEvent) {
        if let Err(e) = sink.send(event).await {
            debug!(error = %e, "Progress event dropped");
        }
    }

    /// Runs the approved plan and stores its results.
    ///
    /// The stored record is re-read after the run. If it was rewound or re-approved in the
    /// meantime the results are discarded and the call fails with a phase error.
    pub async fn run_plan(&self, session_id: &str, sink: &dyn ProgressSink) -> StudioResult<SessionState> {
        let state = self.load(session_id).await?;
        state.require_phase("run_plan", &[Phase::Executing])?;
        let plan = state.analysis_plan.clone().ok_or(StudioError::PlanMissing)?;
        let frame = state.dataframe.clone().ok_or(StudioError::MissingDataFrame)?;
        let driver_target = self.driver_target(&state, &frame);
        let request = match &driver_target {
            DriverTarget::Resolved(request) => Some(request),
            DriverTarget::Unresolved(_) | DriverTarget::Unavailable => None,
        };
        let generation = state.run_generation;

        let outcome = self
            .execution
            .execute(&plan, &frame, sink, request)
            .await;
        if let (Ok(_), DriverTarget::Unresolved(reason)) = (&outcome, &driver_target) {
            ExecutionEngine::driver_analysis_unavailable(sink, reason).await;
        }

        let mut state = self.load(session_id).await?;
        if state.phase != Phase::Executing || state.run_generation != generation {
            warn!(
                session_id = %session_id,
                phase = %state.phase,
                "Discarding results of a superseded run"
            );
            return Err(PhaseError::OperationNotAllowed {
                operation: "run_plan",
                phase: state.phase,
            }
            .into());
        }

        match outcome {
            Ok(outcome) => {
                let failed = outcome.failed_steps();
                state.execution_results = outcome.results;
                if let Some(report) = outcome.investigation {
                    state.target_column = Some(report.bundle.target_column.clone());
                    state.target_type = Some(report.target_type);
                    state.hypotheses = report.hypotheses;
                    state.statistical_results = Some(report.bundle);
                    state.driver_ranking = report.drivers;
                    state.final_answer = Some(report.answer);
                }
                state.advance(Phase::Completed)?;
                let succeeded = state
                    .execution_results
                    .iter()
                    .filter(|r| r.status == StepStatus::Success)
                    .count();
                state.say(
                    Role::Assistant,
                    format!("Plan finished: {succeeded} steps succeeded, {failed} failed."),
                );

                Self::emit(
                    sink,
                    ProgressEvent::AnalysisCompleted {
                        phase: state.phase.to_string(),
                        execution_results: state.execution_results.clone(),
                    },
                )
                .await;
                info!(session_id = %session_id, failed, "Plan run complete");
                self.store.put(state.clone()).await;
                Ok(state)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Plan run aborted");
                state.errors.push(e.to_string());
                state.advance(Phase::Completed)?;
                Self::emit(
                    sink,
                    ProgressEvent::StepFailed {
                        step_id: "execution".to_string(),
                        error: e.to_string(),
                    },
                )
                .await;
                Self::emit(
                    sink,
                    ProgressEvent::AnalysisCompleted {
                        phase: state.phase.to_string(),
                        execution_results: state.execution_results.clone(),
                    },
                )
                .await;
                self.store.put(state).await;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub async fn rewind(&self, session_id: &str, target: Phase) -> StudioResult<SessionState> {
        let mut state = self.load(session_id).await?;
        let from = state.phase;
        state.rewind(target)?;
        info!(session_id = %session_id, from = %from, to = %target, "Phase rewound");
        self.store.put(state.clone()).await;
        Ok(state)
    }

    pub async fn state(&self, session_id: &str) -> StudioResult<SessionState> {
        self.load(session_id).await
    }
}
