// src/dag/mod.rs

//! Stage graph and scheduling.
//!
//! - [`stage`] names the stages a run is built from.
//! - [`task`] pairs a stage with its operation, prerequisites and priority.
//! - [`graph`] validates a set of tasks into a runnable DAG.
//! - [`scheduler`] runs a graph under a concurrency limit.
//! - [`failure`] describes how stages and runs fail.

pub mod failure;
pub mod graph;
pub mod scheduler;
pub mod stage;
mod state;
pub mod task;

pub use failure::{FailureCause, OperationError, RunFailure};
pub use graph::{GraphError, TaskGraph};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use stage::StageId;
pub use task::{FnOperation, Results, StageFuture, StageOperation, Task, operation_fn};
