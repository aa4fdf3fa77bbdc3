//! Progress events and the sinks that receive them.
//!
//! Events serialize as `{"type": "<event>", "payload": {...}}`. Delivery is best effort:
//! the engine logs and drops any `SinkError`.

use crate::types::{ExecutionResult, Metrics, OperationType, StepStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Step id used for the driver-analysis pass that follows a plan.
pub const DRIVER_ANALYSIS_STEP: &str = "driver_analysis";
/// Operation name reported for the driver-analysis pass.
pub const DRIVER_DISCOVERY: &str = "DRIVER_DISCOVERY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProgressEvent {
    StepStarted {
        step_id: String,
        /// Plan operation name, or `DRIVER_DISCOVERY` for the driver-analysis pass
        operation_type: String,
    },
    StepCompleted {
        step_id: String,
        status: StepStatus,
        summary: String,
        metrics: Option<Metrics>,
    },
    StepFailed {
        step_id: String,
        error: String,
    },
    AnalysisCompleted {
        phase: String,
        execution_results: Vec<ExecutionResult>,
    },
}

impl ProgressEvent {
    pub fn started(step_id: &str, operation: OperationType) -> Self {
        Self::StepStarted {
            step_id: step_id.to_string(),
            operation_type: operation.as_str().to_string(),
        }
    }

    pub fn driver_analysis_started() -> Self {
        Self::StepStarted {
            step_id: DRIVER_ANALYSIS_STEP.to_string(),
            operation_type: DRIVER_DISCOVERY.to_string(),
        }
    }

    pub fn driver_analysis_failed(error: impl Into<String>) -> Self {
        Self::StepFailed {
            step_id: DRIVER_ANALYSIS_STEP.to_string(),
            error: error.into(),
        }
    }

    /// Completion or failure event matching an execution result.
    pub fn finished(result: &ExecutionResult, error: Option<String>) -> Self {
        match (result.status, error) {
            (StepStatus::Failed, Some(error)) => Self::StepFailed {
                step_id: result.step_id.clone(),
                error,
            },
            _ => Self::StepCompleted {
                step_id: result.step_id.clone(),
                status: result.status,
                summary: result.result_summary.clone(),
                metrics: result.metrics.clone(),
            },
        }
    }

    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::StepStarted { step_id, .. }
            | Self::StepCompleted { step_id, .. }
            | Self::StepFailed { step_id, .. } => Some(step_id),
            Self::AnalysisCompleted { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("progress receiver disconnected")]
    Disconnected,

    #[error("progress delivery failed: {0}")]
    Delivery(String),
}

/// Receives progress events from a running plan.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn send(&self, event: ProgressEvent) -> Result<(), SinkError>;
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

#[async_trait]
impl ProgressSink for NoOpSink {
    async fn send(&self, _event: ProgressEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving half of a fresh channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn send(&self, event: ProgressEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let event = ProgressEvent::started("s1", OperationType::Groupby);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "step_started");
        assert_eq!(json["payload"]["step_id"], "s1");
        assert_eq!(json["payload"]["operation_type"], "GROUPBY");
    }

    #[test]
    fn test_failed_event_carries_error() {
        let result = ExecutionResult::failed("s2", "TREND failed: boom");
        let event = ProgressEvent::finished(&result, Some("boom".into()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "step_failed");
        assert_eq!(json["payload"]["error"], "boom");
    }

    #[tokio::test]
    async fn test_channel_sink_disconnected() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        let err = sink.send(ProgressEvent::started("s1", OperationType::Summary)).await;
        assert!(matches!(err, Err(SinkError::Disconnected)));
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.send(ProgressEvent::started("s1", OperationType::Summary))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().step_id(), Some("s1"));
    }
}
