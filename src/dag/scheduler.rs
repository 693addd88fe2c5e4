// src/dag/scheduler.rs

//! Dependency-aware concurrent scheduler.
//!
//! Every task in a [`TaskGraph`] is spawned up front. Each one waits on the
//! shared run state until its prerequisites reach a terminal state, then
//! takes a slot from the concurrency gate, runs its operation and publishes
//! the outcome. Dependents are woken through a `watch` channel rather than
//! by polling.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::dag::failure::{FailureCause, OperationError, RunFailure};
use crate::dag::graph::TaskGraph;
use crate::dag::stage::StageId;
use crate::dag::state::{Readiness, RunState};
use crate::dag::task::{Results, Task};
use crate::types::FailurePolicy;

pub const DEFAULT_MAX_PARALLEL: usize = 3;
pub const DEFAULT_DEPENDENCY_TIMEOUT: Duration = Duration::from_secs(300);

/// Knobs for a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Upper bound on operations running at once. Values below 1 are
    /// treated as 1.
    pub max_parallel: usize,
    /// How long a task may wait for its prerequisites, measured from the
    /// moment it starts waiting.
    pub dependency_timeout: Duration,
    /// What happens to other tasks once one has failed.
    pub on_failure: FailurePolicy,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            dependency_timeout: DEFAULT_DEPENDENCY_TIMEOUT,
            on_failure: FailurePolicy::default(),
        }
    }
}

/// Runs a [`TaskGraph`] to completion.
///
/// A scheduler holds no per-run state, so one instance can run several
/// graphs, sequentially or concurrently.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    options: SchedulerOptions,
}

type SharedState<R> = Arc<watch::Sender<RunState<R>>>;

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Execute every task in `graph` and return the results keyed by stage.
    ///
    /// Fails with the first failure recorded during the run. All tasks have
    /// settled by the time this returns, either way.
    pub async fn run<I, R>(&self, graph: TaskGraph<I, R>) -> Result<Results<R>, RunFailure>
    where
        I: Send + Sync + 'static,
        R: Clone + Send + Sync + 'static,
    {
        let limit = self.options.max_parallel.max(1);
        let timeout = self.options.dependency_timeout;

        info!(
            stages = graph.len(),
            max_parallel = limit,
            dependency_timeout = ?timeout,
            on_failure = ?self.options.on_failure,
            "starting scheduler run"
        );

        let state: SharedState<R> = Arc::new(watch::Sender::new(RunState::default()));
        let gate = Arc::new(Semaphore::new(limit));

        let mut set = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, StageId> = HashMap::new();
        let mut prerequisites: HashMap<StageId, BTreeSet<StageId>> = HashMap::new();
        let mut aborted: Vec<StageId> = Vec::new();

        for task in graph.into_launch_order() {
            let stage = task.stage;
            debug!(
                stage = %stage,
                priority = task.priority_value(),
                prerequisites = task.prerequisites().len(),
                "spawning stage"
            );
            prerequisites.insert(stage, task.prerequisites.clone());
            let span = info_span!("stage", stage = %stage);
            let handle = set.spawn(
                run_stage(task, Arc::clone(&state), Arc::clone(&gate), timeout).instrument(span),
            );
            spawned.insert(handle.id(), stage);
        }

        let mut cancelling = false;

        while let Some(joined) = set.join_next_with_id().await {
            if let Err(err) = joined {
                let Some(stage) = spawned.get(&err.id()).copied() else {
                    continue;
                };
                if err.is_panic() {
                    warn!(stage = %stage, "stage operation panicked");
                    state.send_modify(|s| {
                        s.publish_failure(
                            stage,
                            FailureCause::Operation(OperationError::new("operation panicked")),
                        );
                    });
                } else {
                    debug!(stage = %stage, "stage task aborted");
                    aborted.push(stage);
                }
            }

            if self.options.on_failure == FailurePolicy::Cancel
                && !cancelling
                && state.borrow().has_failures()
            {
                cancelling = true;
                warn!(
                    remaining = set.len(),
                    "stage failed; cancelling remaining stages"
                );
                gate.close();
                set.abort_all();
            }
        }

        if !aborted.is_empty() {
            state.send_modify(|s| settle_aborted(s, aborted, &prerequisites));
        }

        let final_state = state.send_replace(RunState::default());
        let failures = final_state.failures();

        match failures.first().cloned() {
            Some((stage, cause)) => {
                warn!(
                    stage = %stage,
                    cause = %cause,
                    failed = failures.len(),
                    "scheduler run failed"
                );
                Err(RunFailure {
                    stage,
                    cause,
                    failures,
                })
            }
            None => {
                let results = final_state.into_results();
                info!(completed = results.len(), "scheduler run completed");
                Ok(results)
            }
        }
    }
}

async fn run_stage<I, R>(task: Task<I, R>, state: SharedState<R>, gate: Arc<Semaphore>, timeout: Duration)
where
    I: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    let stage = task.stage;

    if !task.prerequisites.is_empty() {
        debug!(prerequisites = ?task.prerequisites, "waiting for prerequisites");

        let wait = wait_for_prerequisites(&state, &task.prerequisites);
        // A timeout too large to represent as an instant means no deadline.
        let settled = match Instant::now().checked_add(timeout) {
            Some(deadline) => timeout_at(deadline, wait).await.ok(),
            None => Some(wait.await),
        };

        match settled {
            Some(Readiness::Ready) => {}
            Some(Readiness::Blocked(failed)) => {
                info!(failed = ?failed, "prerequisite failed; skipping stage");
                state.send_modify(|s| {
                    s.publish_failure(stage, FailureCause::DependencyFailed { failed });
                });
                return;
            }
            Some(Readiness::Waiting) | None => {
                let missing = state.borrow().missing(&task.prerequisites);
                warn!(missing = ?missing, waited = ?timeout, "timed out waiting for prerequisites");
                state.send_modify(|s| {
                    s.publish_failure(
                        stage,
                        FailureCause::Timeout {
                            missing,
                            waited: timeout,
                        },
                    );
                });
                return;
            }
        }
    }

    // The gate is only closed when the run is being cancelled.
    let permit = match gate.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            state.send_modify(|s| {
                s.publish_failure(stage, FailureCause::Cancelled);
            });
            return;
        }
    };

    let snapshot = state.borrow().snapshot();
    debug!(visible_results = snapshot.len(), "running stage operation");

    match task.operation.run(Arc::clone(&task.input), snapshot).await {
        Ok(value) => {
            state.send_modify(|s| {
                s.publish_success(stage, value);
            });
            info!("stage completed");
        }
        Err(err) => {
            warn!(error = %err, "stage operation failed");
            state.send_modify(|s| {
                s.publish_failure(stage, FailureCause::Operation(err));
            });
        }
    }

    drop(permit);
}

/// Resolve once every prerequisite is terminal, or any of them failed.
async fn wait_for_prerequisites<R: Clone>(
    state: &watch::Sender<RunState<R>>,
    prerequisites: &BTreeSet<StageId>,
) -> Readiness {
    let mut rx = state.subscribe();
    let settled = rx
        .wait_for(|s| s.readiness(prerequisites) != Readiness::Waiting)
        .await
        .map(|s| s.readiness(prerequisites));

    // The sender outlives every task in the run, so a closed channel only
    // happens during teardown.
    settled.unwrap_or(Readiness::Waiting)
}

/// Record the stages aborted by the cancel policy.
///
/// An aborted stage whose prerequisite failed is a dependency failure like
/// any other; the rest are cancelled. Stages are settled prerequisites first,
/// so the outcome does not depend on the order the aborts were joined in.
fn settle_aborted<R: Clone>(
    state: &mut RunState<R>,
    mut aborted: Vec<StageId>,
    prerequisites: &HashMap<StageId, BTreeSet<StageId>>,
) {
    aborted.retain(|stage| !state.is_terminal(*stage));
    aborted.sort();

    while !aborted.is_empty() {
        let next = aborted
            .iter()
            .position(|stage| {
                prerequisites
                    .get(stage)
                    .is_none_or(|pre| pre.iter().all(|p| !aborted.contains(p)))
            })
            .unwrap_or(0);
        let stage = aborted.remove(next);

        let cause = match prerequisites.get(&stage).map(|pre| state.readiness(pre)) {
            Some(Readiness::Blocked(failed)) => FailureCause::DependencyFailed { failed },
            _ => FailureCause::Cancelled,
        };
        debug!(stage = %stage, cause = %cause, "settling aborted stage");
        state.publish_failure(stage, cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_dependents_of_a_failure_are_dependency_failures() {
        let mut state: RunState<String> = RunState::default();
        state.publish_failure(StageId::Analysis, FailureCause::Cancelled);
        let prerequisites: HashMap<StageId, BTreeSet<StageId>> = HashMap::from([
            (StageId::Analysis, BTreeSet::new()),
            (StageId::Readme, BTreeSet::from([StageId::Architecture])),
            (StageId::ApiDocs, BTreeSet::from([StageId::Analysis])),
            (StageId::Architecture, BTreeSet::new()),
        ]);

        // Join order puts the dependent ahead of its own prerequisite.
        settle_aborted(
            &mut state,
            vec![StageId::Readme, StageId::ApiDocs, StageId::Architecture],
            &prerequisites,
        );

        let failures: HashMap<_, _> = state.failures().into_iter().collect();
        assert_eq!(
            failures[&StageId::ApiDocs],
            FailureCause::DependencyFailed {
                failed: vec![StageId::Analysis]
            }
        );
        assert_eq!(failures[&StageId::Architecture], FailureCause::Cancelled);
        assert_eq!(
            failures[&StageId::Readme],
            FailureCause::DependencyFailed {
                failed: vec![StageId::Architecture]
            }
        );
    }

    #[test]
    fn already_settled_stages_are_left_alone() {
        let mut state: RunState<String> = RunState::default();
        state.publish_success(StageId::Analysis, "done".to_string());
        let prerequisites = HashMap::from([(StageId::Analysis, BTreeSet::new())]);

        settle_aborted(&mut state, vec![StageId::Analysis], &prerequisites);

        assert!(!state.has_failures());
    }
}
