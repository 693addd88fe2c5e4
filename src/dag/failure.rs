// src/dag/failure.rs

//! Failure taxonomy for a scheduling run.

use std::time::Duration;

use thiserror::Error;

use crate::dag::stage::{StageId, join_stages};

/// A stage operation returned an error.
///
/// The scheduler treats operations as black boxes, so only the rendered
/// message is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a stage ended in the `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The stage's own operation failed (or panicked).
    #[error("operation failed: {0}")]
    Operation(OperationError),

    /// A prerequisite failed before this stage could start. The operation
    /// was never invoked.
    #[error("dependencies failed: {}", join_stages(.failed))]
    DependencyFailed { failed: Vec<StageId> },

    /// The stage waited past its deadline for prerequisites to complete.
    #[error("timed out after {waited:?} waiting for dependencies: {}", join_stages(.missing))]
    Timeout {
        missing: Vec<StageId>,
        waited: Duration,
    },

    /// The stage was aborted because a sibling failed under the `cancel`
    /// failure policy.
    #[error("cancelled after another stage failed")]
    Cancelled,
}

impl FailureCause {
    /// Root causes originate in the stage itself rather than being inherited
    /// from another stage's failure.
    pub fn is_root_cause(&self) -> bool {
        matches!(self, FailureCause::Operation(_) | FailureCause::Timeout { .. })
    }
}

/// Aggregate failure of a scheduling run.
///
/// `stage` and `cause` are the first failure recorded during the run;
/// `failures` holds every failed stage in the order the failures were
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage '{stage}' failed: {cause}")]
pub struct RunFailure {
    pub stage: StageId,
    pub cause: FailureCause,
    pub failures: Vec<(StageId, FailureCause)>,
}

impl RunFailure {
    /// Cause recorded for `stage`, if it failed in this run.
    pub fn cause_of(&self, stage: StageId) -> Option<&FailureCause> {
        self.failures
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, cause)| cause)
    }

    pub fn failed_stages(&self) -> Vec<StageId> {
        self.failures.iter().map(|(s, _)| *s).collect()
    }
}
