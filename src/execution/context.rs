//! Typed state shared between steps of one plan run.

use super::models::{LinearRegression, LogisticRegression};
use crate::types::TargetType;

/// Fitted baseline model.
#[derive(Debug, Clone)]
pub enum TrainedModel {
    Logistic(LogisticRegression),
    Linear(LinearRegression),
}

/// Held-out predictions of the last TRAIN_MODEL step.
///
/// Classification labels are class codes stored as `f64`.
#[derive(Debug, Clone)]
pub struct TrainedState {
    pub model: TrainedModel,
    pub task_type: TargetType,
    pub target_column: String,
    pub y_test: Vec<f64>,
    pub y_pred: Vec<f64>,
}

/// Scoped to a single `ExecutionEngine::execute` call.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    pub trained: Option<TrainedState>,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_model(&self) -> bool {
        self.trained.is_some()
    }
}
