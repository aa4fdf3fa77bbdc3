//! Insight Studio: goal-driven driver discovery over tabular data.
//!
//! ## Architecture
//!
//! - **Statistical Test Selector**: picks and runs the right test per feature/target pair
//! - **Feature Importance Aggregator**: random-forest importances folded onto source features
//! - **Driver Ranking Engine**: combines test outputs into normalized, ranked driver scores
//! - **Execution Plan Engine**: runs typed analysis plans step by step with progress events
//! - **Phase State Machine**: per-session lifecycle, transitions and rewinds

pub mod config;
pub mod error;
pub mod execution;
pub mod investigation;
pub mod planning;
pub mod preparation;
pub mod profiling;
pub mod session;
pub mod stats;
pub mod types;

pub use config::StudioConfig;
pub use error::{StudioError, StudioResult};

// Re-export the analysis stages
pub use execution::{
    ChannelSink, ExecutionEngine, ExecutionOutcome, InvestigationRequest, NoOpSink,
    ProgressEvent, ProgressSink, StepError,
};
pub use investigation::{
    DriverRankingEngine, ImportanceAggregator, InvestigationEngine, InvestigationReport,
    TestSelector,
};
pub use planning::{AnalysisPlanner, IntentParser, KeywordIntentParser, RulePlanner};
pub use preparation::{
    DatasetSummarizer, DomainClassifier, MissingValueTreatment, ProfileSummarizer,
    RoleDomainClassifier,
};
pub use profiling::DatasetProfiler;

// Re-export session lifecycle
pub use session::{InMemorySessionStore, Phase, PhaseError, SessionState, SessionStore, Studio};

// Re-export commonly used types
pub use types::{
    AnalysisPlan, Column, DataFrame, DatasetProfile, DatasetSummaryReport, DomainClassification,
    DriverScore, ExecutionResult, FinalAnalysisAnswer, Hypothesis, MissingValueAction,
    MissingValueSolution, MissingValueTreatmentResult, OperationType, PlanStep, SignificanceLabel,
    StatisticalFeatureResult, StatisticalResultBundle, StepStatus, TargetType, TestType,
};
