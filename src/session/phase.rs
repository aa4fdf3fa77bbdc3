//! Session phases and the transition table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle stage of a session, in canonical order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Landing,
    DataUploaded,
    ProfileReady,
    WaitingForIntent,
    IntentParsed,
    TargetValidationRequired,
    Investigating,
    DriverRanked,
    AnswerReady,
    PlanReady,
    Executing,
    Completed,
}

impl Phase {
    pub const ALL: [Self; 12] = [
        Self::Landing,
        Self::DataUploaded,
        Self::ProfileReady,
        Self::WaitingForIntent,
        Self::IntentParsed,
        Self::TargetValidationRequired,
        Self::Investigating,
        Self::DriverRanked,
        Self::AnswerReady,
        Self::PlanReady,
        Self::Executing,
        Self::Completed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "LANDING",
            Self::DataUploaded => "DATA_UPLOADED",
            Self::ProfileReady => "PROFILE_READY",
            Self::WaitingForIntent => "WAITING_FOR_INTENT",
            Self::IntentParsed => "INTENT_PARSED",
            Self::TargetValidationRequired => "TARGET_VALIDATION_REQUIRED",
            Self::Investigating => "INVESTIGATING",
            Self::DriverRanked => "DRIVER_RANKED",
            Self::AnswerReady => "ANSWER_READY",
            Self::PlanReady => "PLAN_READY",
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
        }
    }

    /// Position in the canonical order.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Forward transitions produced by completing an operation.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Landing, Self::DataUploaded)
                | (Self::DataUploaded, Self::ProfileReady)
                | (Self::ProfileReady, Self::WaitingForIntent)
                | (Self::WaitingForIntent | Self::AnswerReady, Self::IntentParsed)
                | (
                    Self::WaitingForIntent | Self::IntentParsed | Self::AnswerReady,
                    Self::PlanReady
                )
                | (Self::IntentParsed, Self::TargetValidationRequired | Self::Investigating)
                | (Self::TargetValidationRequired, Self::Investigating)
                | (Self::Investigating, Self::DriverRanked)
                | (Self::DriverRanked, Self::AnswerReady)
                | (Self::PlanReady, Self::Executing)
                | (Self::Executing, Self::Completed)
        )
    }

    /// Validates a forward transition.
    pub fn advance(self, next: Self) -> Result<Self, PhaseError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(PhaseError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Validates a rewind. Only earlier or equal phases are reachable.
    pub fn rewind_to(self, target: Self) -> Result<Self, PhaseError> {
        if target.index() > self.index() {
            Err(PhaseError::ForwardRewind {
                from: self,
                to: target,
            })
        } else {
            Ok(target)
        }
    }

    /// Phases before EXECUTING own no plan or investigation outputs.
    pub const fn clears_outputs(self) -> bool {
        self.index() < Self::Executing.index()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("illegal phase transition {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    #[error("cannot move phase forward via rewind: {from} -> {to}")]
    ForwardRewind { from: Phase, to: Phase },

    #[error("{operation} is not allowed at phase {phase}")]
    OperationNotAllowed {
        operation: &'static str,
        phase: Phase,
    },
}
