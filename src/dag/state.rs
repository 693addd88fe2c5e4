// src/dag/state.rs

//! Shared bookkeeping for a single scheduling run.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::dag::failure::FailureCause;
use crate::dag::stage::StageId;
use crate::dag::task::Results;

/// Outcome of checking a task's prerequisites against the run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// Every prerequisite completed.
    Ready,
    /// At least one prerequisite failed; the listed ones are the failed ones.
    Blocked(Vec<StageId>),
    /// Some prerequisites have not reached a terminal state yet.
    Waiting,
}

/// Results and terminal states recorded so far.
///
/// A stage appears in at most one of `completed` and `failed`, and only
/// completed stages have an entry in `results`.
#[derive(Debug)]
pub(crate) struct RunState<R> {
    results: Results<R>,
    completed: BTreeSet<StageId>,
    failed: BTreeMap<StageId, FailureCause>,
    failure_order: Vec<StageId>,
}

impl<R> Default for RunState<R> {
    fn default() -> Self {
        Self {
            results: BTreeMap::new(),
            completed: BTreeSet::new(),
            failed: BTreeMap::new(),
            failure_order: Vec::new(),
        }
    }
}

impl<R: Clone> RunState<R> {
    pub(crate) fn is_terminal(&self, stage: StageId) -> bool {
        self.completed.contains(&stage) || self.failed.contains_key(&stage)
    }

    /// Record a successful result. Returns `false` if the stage already had
    /// a terminal state, in which case nothing changes.
    pub(crate) fn publish_success(&mut self, stage: StageId, value: R) -> bool {
        if self.is_terminal(stage) {
            warn!(stage = %stage, "ignoring second terminal state for stage");
            return false;
        }
        self.results.insert(stage, value);
        self.completed.insert(stage);
        true
    }

    /// Record a failure. Returns `false` if the stage already had a terminal
    /// state, in which case nothing changes.
    pub(crate) fn publish_failure(&mut self, stage: StageId, cause: FailureCause) -> bool {
        if self.is_terminal(stage) {
            warn!(stage = %stage, "ignoring second terminal state for stage");
            return false;
        }
        self.failed.insert(stage, cause);
        self.failure_order.push(stage);
        true
    }

    pub(crate) fn readiness<'a>(
        &self,
        prerequisites: impl IntoIterator<Item = &'a StageId>,
    ) -> Readiness {
        let mut blocked = Vec::new();
        let mut waiting = false;

        for stage in prerequisites {
            if self.failed.contains_key(stage) {
                blocked.push(*stage);
            } else if !self.completed.contains(stage) {
                waiting = true;
            }
        }

        if !blocked.is_empty() {
            Readiness::Blocked(blocked)
        } else if waiting {
            Readiness::Waiting
        } else {
            Readiness::Ready
        }
    }

    /// Prerequisites that have not completed.
    pub(crate) fn missing<'a>(
        &self,
        prerequisites: impl IntoIterator<Item = &'a StageId>,
    ) -> Vec<StageId> {
        prerequisites
            .into_iter()
            .filter(|s| !self.completed.contains(s))
            .copied()
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Results<R> {
        self.results.clone()
    }

    pub(crate) fn has_failures(&self) -> bool {
        !self.failure_order.is_empty()
    }

    /// Failures in the order they were recorded.
    pub(crate) fn failures(&self) -> Vec<(StageId, FailureCause)> {
        self.failure_order
            .iter()
            .filter_map(|stage| self.failed.get(stage).map(|c| (*stage, c.clone())))
            .collect()
    }

    pub(crate) fn into_results(self) -> Results<R> {
        self.results
    }
}
