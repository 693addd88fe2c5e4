// src/dag/task.rs

//! Stage tasks and the operation trait they run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dag::failure::OperationError;
use crate::dag::stage::StageId;

/// Snapshot of results published so far, keyed by stage.
pub type Results<R> = BTreeMap<StageId, R>;

/// Boxed future returned by a [`StageOperation`].
pub type StageFuture<R> = Pin<Box<dyn Future<Output = Result<R, OperationError>> + Send>>;

/// The job function of a stage.
///
/// It receives the shared input and a snapshot of results published before
/// it started. The snapshot always holds every declared prerequisite; it may
/// also hold unrelated stages that happened to finish first, which callers
/// must not rely on.
pub trait StageOperation<I, R>: Send + Sync {
    fn run(&self, input: Arc<I>, results: Results<R>) -> StageFuture<R>;
}

/// Adapter turning an async closure into a [`StageOperation`].
pub struct FnOperation<F> {
    f: F,
}

/// Wrap `f` so it can be used as a stage operation.
pub fn operation_fn<I, R, F, Fut>(f: F) -> FnOperation<F>
where
    F: Fn(Arc<I>, Results<R>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, OperationError>> + Send + 'static,
{
    FnOperation { f }
}

impl<I, R, F, Fut> StageOperation<I, R> for FnOperation<F>
where
    F: Fn(Arc<I>, Results<R>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, OperationError>> + Send + 'static,
{
    fn run(&self, input: Arc<I>, results: Results<R>) -> StageFuture<R> {
        Box::pin((self.f)(input, results))
    }
}

/// A stage, its operation, prerequisites, shared input and launch priority.
pub struct Task<I, R> {
    pub(crate) stage: StageId,
    pub(crate) operation: Arc<dyn StageOperation<I, R>>,
    pub(crate) prerequisites: BTreeSet<StageId>,
    pub(crate) input: Arc<I>,
    pub(crate) priority: i32,
}

impl<I, R> Task<I, R> {
    pub fn new(
        stage: StageId,
        operation: Arc<dyn StageOperation<I, R>>,
        input: Arc<I>,
    ) -> Self {
        Self {
            stage,
            operation,
            prerequisites: BTreeSet::new(),
            input,
            priority: 0,
        }
    }

    /// Declare that this task waits for `stage`.
    pub fn after(mut self, stage: StageId) -> Self {
        self.prerequisites.insert(stage);
        self
    }

    /// Higher priority launches earlier among tasks with the same number of
    /// prerequisites.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn stage(&self) -> StageId {
        self.stage
    }

    pub fn prerequisites(&self) -> &BTreeSet<StageId> {
        &self.prerequisites
    }

    pub fn priority_value(&self) -> i32 {
        self.priority
    }
}

impl<I, R> fmt::Debug for Task<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("stage", &self.stage)
            .field("prerequisites", &self.prerequisites)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
