//! Plan execution.
//!
//! ## Architecture
//! - `engine`: runs an `AnalysisPlan` step by step with per-step failure isolation
//! - `operations`: one function per `OperationType`
//! - `models`: baseline logistic/linear models and their metrics
//! - `context`: typed state handed from TRAIN_MODEL to EVALUATE_MODEL
//! - `progress`: progress events and sinks

pub mod context;
pub mod engine;
pub mod models;
pub mod operations;
pub mod progress;

pub use context::{StepContext, TrainedModel, TrainedState};
pub use engine::{ExecutionEngine, ExecutionOutcome, InvestigationRequest};
pub use progress::{ChannelSink, NoOpSink, ProgressEvent, ProgressSink, SinkError};

use crate::types::FrameError;
use thiserror::Error;

/// Step-local failure. Recorded as a FAILED `ExecutionResult`; never aborts the plan.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error("parameter '{0}' is required")]
    MissingParameter(String),

    #[error("column '{0}' is not present in the dataset")]
    ColumnNotFound(String),

    #[error("aggregation '{agg}' is not supported for column '{column}'")]
    UnsupportedAggregation { agg: String, column: String },

    #[error("at least two numeric columns are required for correlation")]
    InsufficientNumericColumns,

    #[error("no parseable datetime values for trend analysis")]
    NoParseableDates,

    #[error("no valid rows after filtering missing values")]
    NoValidRows,

    #[error("training data contains a single class")]
    SingleClass,

    #[error("no trained model available for evaluation")]
    NoTrainedModel,

    #[error("unknown cleaning operation '{0}'")]
    UnknownCleaningOperation(String),

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("{available} usable rows, at least {required} required")]
    InsufficientRows { available: usize, required: usize },

    #[error("numeric failure: {0}")]
    Numeric(String),
}

impl From<FrameError> for StepError {
    fn from(err: FrameError) -> Self {
        Self::Numeric(err.to_string())
    }
}
