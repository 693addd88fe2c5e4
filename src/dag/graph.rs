// src/dag/graph.rs

//! Validated stage graph.

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use thiserror::Error;

use crate::dag::stage::StageId;
use crate::dag::task::Task;

/// Reasons a set of tasks cannot form a runnable graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("task graph must contain at least one task")]
    Empty,

    #[error("stage '{0}' is declared more than once")]
    DuplicateStage(StageId),

    #[error("stage '{0}' cannot depend on itself")]
    SelfDependency(StageId),

    #[error("stage '{stage}' depends on '{prerequisite}', which has no task in this graph")]
    UnknownPrerequisite {
        stage: StageId,
        prerequisite: StageId,
    },

    #[error("cycle detected in stage graph involving stage '{0}'")]
    Cycle(StageId),
}

/// A set of tasks whose prerequisites all resolve and form a DAG.
///
/// Only a `TaskGraph` can be handed to the scheduler, so every run starts
/// from a graph in which every waiting task can eventually be satisfied.
#[derive(Debug)]
pub struct TaskGraph<I, R> {
    tasks: BTreeMap<StageId, Task<I, R>>,
}

impl<I, R> TaskGraph<I, R> {
    pub fn new(tasks: Vec<Task<I, R>>) -> Result<Self, GraphError> {
        if tasks.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut by_stage = BTreeMap::new();
        for task in tasks {
            let stage = task.stage;
            if by_stage.insert(stage, task).is_some() {
                return Err(GraphError::DuplicateStage(stage));
            }
        }

        validate_prerequisites(&by_stage)?;
        validate_acyclic(&by_stage)?;

        Ok(Self { tasks: by_stage })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stages(&self) -> impl Iterator<Item = StageId> + '_ {
        self.tasks.keys().copied()
    }

    pub fn prerequisites_of(&self, stage: StageId) -> Vec<StageId> {
        self.tasks
            .get(&stage)
            .map(|t| t.prerequisites.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Stages in launch order: fewest prerequisites first, then highest
    /// priority, then stage order.
    pub fn launch_order(&self) -> Vec<StageId> {
        let mut order: Vec<&Task<I, R>> = self.tasks.values().collect();
        order.sort_by_key(|t| (t.prerequisites.len(), std::cmp::Reverse(t.priority), t.stage));
        order.into_iter().map(|t| t.stage).collect()
    }

    /// Consume the graph, yielding tasks in launch order.
    pub(crate) fn into_launch_order(mut self) -> Vec<Task<I, R>> {
        self.launch_order()
            .into_iter()
            .filter_map(|stage| self.tasks.remove(&stage))
            .collect()
    }
}

fn validate_prerequisites<I, R>(tasks: &BTreeMap<StageId, Task<I, R>>) -> Result<(), GraphError> {
    for (stage, task) in tasks.iter() {
        for prerequisite in task.prerequisites.iter() {
            if prerequisite == stage {
                return Err(GraphError::SelfDependency(*stage));
            }
            if !tasks.contains_key(prerequisite) {
                return Err(GraphError::UnknownPrerequisite {
                    stage: *stage,
                    prerequisite: *prerequisite,
                });
            }
        }
    }
    Ok(())
}

fn validate_acyclic<I, R>(tasks: &BTreeMap<StageId, Task<I, R>>) -> Result<(), GraphError> {
    // Edge direction: prerequisite -> dependent.
    let mut graph: DiGraphMap<StageId, ()> = DiGraphMap::new();

    for stage in tasks.keys() {
        graph.add_node(*stage);
    }

    for (stage, task) in tasks.iter() {
        for prerequisite in task.prerequisites.iter() {
            graph.add_edge(*prerequisite, *stage, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(GraphError::Cycle(cycle.node_id())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dag::task::{Results, operation_fn};

    fn task(stage: StageId) -> Task<(), u32> {
        let op = operation_fn(|_input: Arc<()>, _results: Results<u32>| async { Ok(1) });
        Task::new(stage, Arc::new(op), Arc::new(()))
    }

    #[test]
    fn rejects_empty_graph() {
        let err = TaskGraph::<(), u32>::new(Vec::new()).unwrap_err();
        assert_eq!(err, GraphError::Empty);
    }

    #[test]
    fn rejects_duplicate_stage() {
        let err = TaskGraph::new(vec![task(StageId::Analysis), task(StageId::Analysis)]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateStage(StageId::Analysis));
    }

    #[test]
    fn rejects_self_dependency() {
        let err = TaskGraph::new(vec![task(StageId::Readme).after(StageId::Readme)]).unwrap_err();
        assert_eq!(err, GraphError::SelfDependency(StageId::Readme));
    }

    #[test]
    fn rejects_unknown_prerequisite() {
        let err = TaskGraph::new(vec![task(StageId::Readme).after(StageId::Analysis)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownPrerequisite {
                stage: StageId::Readme,
                prerequisite: StageId::Analysis,
            }
        );
    }

    #[test]
    fn rejects_cycle() {
        let err = TaskGraph::new(vec![
            task(StageId::Analysis).after(StageId::Readme),
            task(StageId::Readme).after(StageId::Analysis),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn launch_order_prefers_fewer_prerequisites_then_priority() {
        let graph = TaskGraph::new(vec![
            task(StageId::Readme).after(StageId::Analysis).priority(1),
            task(StageId::ApiDocs).after(StageId::Analysis).priority(5),
            task(StageId::Analysis).priority(10),
        ])
        .unwrap();

        assert_eq!(
            graph.launch_order(),
            vec![StageId::Analysis, StageId::ApiDocs, StageId::Readme]
        );
        assert_eq!(graph.prerequisites_of(StageId::Readme), vec![StageId::Analysis]);
    }
}
