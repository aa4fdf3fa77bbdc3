//! Run-fatal and session-level errors.
//!
//! Skip-feature conditions are `Option::None` in the selector and never reach this type.
//! Step-local failures are `execution::StepError` and become FAILED execution results.

use crate::session::PhaseError;
use crate::types::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("no dataframe available for this session")]
    MissingDataFrame,

    #[error("dataset has not been profiled")]
    MissingProfile,

    #[error("target column '{0}' is not present in the dataset")]
    TargetNotFound(String),

    #[error("target column '{column}' is unusable: {reason}")]
    InvalidTarget { column: String, reason: String },

    #[error("no analysis plan is available")]
    PlanMissing,

    #[error("missing-value solution '{0}' is not offered for this dataset")]
    SolutionNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type StudioResult<T> = Result<T, StudioError>;
