//! Plan execution engine.
//!
//! Steps run in plan order against a working copy of the dataset. A failing step becomes a
//! FAILED result and the next step still runs. When an investigation request accompanies the
//! plan, the driver-analysis pass runs after the last step against the final working frame.

use super::context::StepContext;
use super::operations::{self, StepOutput};
use super::progress::{ProgressEvent, ProgressSink, DRIVER_ANALYSIS_STEP};
use super::StepError;
use crate::config::{ExecutionConfig, StudioConfig};
use crate::error::{StudioError, StudioResult};
use crate::investigation::{InvestigationEngine, InvestigationReport};
use crate::types::{
    AnalysisPlan, DataFrame, DatasetProfile, ExecutionResult, Metrics, OperationType, PlanStep,
};
use serde_json::json;
use tracing::{debug, info, warn};

/// Context needed to run the driver-analysis pass after a plan.
#[derive(Debug, Clone)]
pub struct InvestigationRequest {
    pub profile: DatasetProfile,
    pub target_column: String,
    pub question: String,
}

/// Everything a plan run produced.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// One result per plan step, in plan order
    pub results: Vec<ExecutionResult>,
    /// Frame after every CLEAN_DATA step was applied
    pub working_frame: DataFrame,
    /// Driver-analysis report when requested and successful
    pub investigation: Option<InvestigationReport>,
}

impl ExecutionOutcome {
    pub fn failed_steps(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    cfg: ExecutionConfig,
    investigation: InvestigationEngine,
}

impl ExecutionEngine {
    pub fn new(cfg: &StudioConfig) -> Self {
        Self {
            cfg: cfg.execution.clone(),
            investigation: InvestigationEngine::new(cfg),
        }
    }

    pub fn from_global() -> Self {
        Self::new(crate::config::get())
    }

    pub fn with_investigation_engine(mut self, engine: InvestigationEngine) -> Self {
        self.investigation = engine;
        self
    }

    async fn emit(sink: &dyn ProgressSink, event: ProgressEvent) {
        if let Err(e) = sink.send(event).await {
            debug!(error = %e, "Progress event dropped");
        }
    }

    fn run_step(
        &self,
        step: &PlanStep,
        frame: &mut DataFrame,
        ctx: &mut StepContext,
    ) -> Result<StepOutput, StepError> {
        match step.operation_type {
            OperationType::Summary => operations::summary(frame),
            OperationType::Groupby => operations::groupby(frame, step, &self.cfg),
            OperationType::Correlation => operations::correlation(frame),
            OperationType::Trend => operations::trend(frame, step),
            OperationType::TrainModel => operations::train_model(frame, step, &self.cfg, ctx),
            OperationType::EvaluateModel => operations::evaluate_model(ctx),
            OperationType::CleanData => {
                let (output, cleaned) = operations::clean_data(frame, step)?;
                *frame = cleaned;
                Ok(output)
            }
        }
    }

    /// Executes `plan` against a copy of `frame`.
    ///
    /// Fails before any step runs when there is no dataset to work on. Progress delivery
    /// failures are logged and ignored.
    pub async fn execute(
        &self,
        plan: &AnalysisPlan,
        frame: &DataFrame,
        sink: &dyn ProgressSink,
        request: Option<&InvestigationRequest>,
    ) -> StudioResult<ExecutionOutcome> {
        if frame.column_count() == 0 {
            return Err(StudioError::MissingDataFrame);
        }

        info!(
            intent = %plan.intent_type,
            steps = plan.steps.len(),
            rows = frame.row_count(),
            "Executing analysis plan"
        );

        let mut working = frame.clone();
        let mut ctx = StepContext::new();
        let mut results = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            Self::emit(sink, ProgressEvent::started(&step.step_id, step.operation_type)).await;
            tokio::task::yield_now().await;

            let (result, error) = match self.run_step(step, &mut working, &mut ctx) {
                Ok(output) => {
                    debug!(step_id = %step.step_id, operation = %step.operation_type, "Step completed");
                    (
                        ExecutionResult::success(&step.step_id, output.summary, output.metrics),
                        None,
                    )
                }
                Err(e) => {
                    warn!(step_id = %step.step_id, operation = %step.operation_type, error = %e, "Step failed");
                    (
                        ExecutionResult::failed(
                            &step.step_id,
                            format!("{} failed: {e}", step.operation_type),
                        ),
                        Some(e.to_string()),
                    )
                }
            };

            Self::emit(sink, ProgressEvent::finished(&result, error)).await;
            results.push(result);
        }

        let investigation = match request {
            Some(request) => self.driver_analysis(&working, request, sink).await,
            None => None,
        };

        let outcome = ExecutionOutcome {
            results,
            working_frame: working,
            investigation,
        };
        info!(
            steps = outcome.results.len(),
            failed = outcome.failed_steps(),
            drivers = outcome.investigation.as_ref().map_or(0, |r| r.drivers.len()),
            "Analysis plan finished"
        );
        Ok(outcome)
    }

    /// Investigation pass after the plan. Its failure is reported as a progress event only.
    async fn driver_analysis(
        &self,
        frame: &DataFrame,
        request: &InvestigationRequest,
        sink: &dyn ProgressSink,
    ) -> Option<InvestigationReport> {
        Self::emit(sink, ProgressEvent::driver_analysis_started()).await;
        tokio::task::yield_now().await;

        match self.investigation.investigate(
            frame,
            &request.profile,
            &request.target_column,
            &request.question,
        ) {
            Ok(report) => {
                let mut metrics = Metrics::new();
                metrics.insert("hypotheses".into(), json!(report.hypotheses.len()));
                metrics.insert("statistical_results".into(), json!(report.bundle.results.len()));
                metrics.insert("drivers".into(), json!(report.drivers.len()));
                let result = ExecutionResult::success(
                    DRIVER_ANALYSIS_STEP,
                    "Generated ranked drivers and synthesized analytical interpretation.",
                    metrics,
                );
                Self::emit(sink, ProgressEvent::finished(&result, None)).await;
                Some(report)
            }
            Err(e) => {
                warn!(target_column = %request.target_column, error = %e, "Driver analysis failed");
                Self::emit(sink, ProgressEvent::driver_analysis_failed(e.to_string())).await;
                None
            }
        }
    }

    /// Reports a driver-analysis pass that could not start, e.g. because no single target
    /// column could be resolved. Emitted in the position the pass would have run.
    pub async fn driver_analysis_unavailable(sink: &dyn ProgressSink, reason: &str) {
        warn!(reason = %reason, "Driver analysis skipped");
        Self::emit(sink, ProgressEvent::driver_analysis_started()).await;
        Self::emit(sink, ProgressEvent::driver_analysis_failed(reason)).await;
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(&StudioConfig::default())
    }
}
