// tests/properties.rs

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::time::Duration;

use docdag::batch::{BatchPartitioner, Extraction};
use docdag::dag::{Scheduler, SchedulerOptions, StageId, TaskGraph};
use docdag::types::FailurePolicy;
use docdag_test_utils::builders::{failed, identifiers, summary};
use docdag_test_utils::counters::ScriptedCounter;
use docdag_test_utils::probe::{Behaviour, Probe};
use proptest::prelude::*;

// Each document gets a scripted prompt cost; some are failed extractions.
fn documents_strategy() -> impl Strategy<Value = (Vec<Extraction>, ScriptedCounter)> {
    proptest::collection::vec((1..3000usize, any::<bool>()), 0..40).prop_map(|docs| {
        let mut counter = ScriptedCounter::new();
        let mut extractions = Vec::with_capacity(docs.len());
        for (i, (cost, readable)) in docs.into_iter().enumerate() {
            let id = format!("f{i}.py");
            if readable {
                counter = counter.cost(&id, cost);
                extractions.push(summary(&id));
            } else {
                extractions.push(failed(&id));
            }
        }
        (extractions, counter)
    })
}

proptest! {
    #[test]
    fn partition_preserves_order_and_drops_nothing(
        (docs, counter) in documents_strategy(),
        budget in 1..6000usize,
    ) {
        let partitioner = BatchPartitioner::new(counter, NonZeroUsize::new(budget).unwrap());
        let batches = partitioner.partition(&docs);

        let flattened: Vec<String> = batches
            .iter()
            .flat_map(|b| b.identifiers().map(str::to_string).collect::<Vec<_>>())
            .collect();
        prop_assert_eq!(flattened, identifiers(&docs));
        prop_assert!(batches.iter().all(|b| !b.is_empty()));
    }

    #[test]
    fn every_batch_fits_or_is_a_singleton(
        (docs, counter) in documents_strategy(),
        budget in 1..6000usize,
    ) {
        let partitioner = BatchPartitioner::new(counter, NonZeroUsize::new(budget).unwrap());

        for batch in partitioner.partition(&docs) {
            let sum: usize = batch.summaries().iter().map(|s| partitioner.prompt_cost(s)).sum();
            prop_assert_eq!(batch.prompt_cost(), sum);
            prop_assert!(batch.prompt_cost() <= budget || batch.len() == 1);
        }
    }

    #[test]
    fn adjacent_batches_could_not_be_merged(
        (docs, counter) in documents_strategy(),
        budget in 1..6000usize,
    ) {
        let partitioner = BatchPartitioner::new(counter, NonZeroUsize::new(budget).unwrap());
        let batches = partitioner.partition(&docs);

        // Greedy filling: the next batch's first summary did not fit.
        for pair in batches.windows(2) {
            let head = partitioner.prompt_cost(&pair[1].summaries()[0]);
            prop_assert!(pair[0].prompt_cost() + head > budget);
        }
    }

    #[test]
    fn partition_is_deterministic(
        (docs, counter) in documents_strategy(),
        budget in 1..6000usize,
    ) {
        let partitioner = BatchPartitioner::new(counter, NonZeroUsize::new(budget).unwrap());
        prop_assert_eq!(partitioner.partition(&docs), partitioner.partition(&docs));
    }
}

// Random DAG over the four stages: a stage may only depend on stages listed
// before it, which keeps the graph acyclic.
fn dag_strategy() -> impl Strategy<Value = Vec<(StageId, BTreeSet<StageId>, bool)>> {
    proptest::collection::vec(
        (proptest::collection::vec(any::<bool>(), 4), any::<bool>()),
        4,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (edges, fails))| {
                let prerequisites = StageId::ALL[..i]
                    .iter()
                    .zip(edges)
                    .filter(|(_, keep)| *keep)
                    .map(|(stage, _)| *stage)
                    .collect();
                (StageId::ALL[i], prerequisites, fails)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn every_stage_settles_and_successes_respect_prerequisites(
        dag in dag_strategy(),
        max_parallel in 1..4usize,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let probe = Probe::new();
        let tasks = dag
            .iter()
            .map(|(stage, prerequisites, fails)| {
                let behaviour = if *fails {
                    Behaviour::Fail(Duration::from_millis(5), "boom".to_string())
                } else {
                    Behaviour::Succeed(Duration::from_millis(5))
                };
                prerequisites
                    .iter()
                    .fold(probe.task(*stage, behaviour), |task, p| task.after(*p))
            })
            .collect();
        let graph = TaskGraph::new(tasks).unwrap();

        let scheduler = Scheduler::new(SchedulerOptions {
            max_parallel,
            dependency_timeout: Duration::from_secs(60),
            on_failure: FailurePolicy::Drain,
        });
        let outcome = runtime.block_on(scheduler.run(graph));

        prop_assert!(probe.peak() <= max_parallel);

        let any_failing = dag.iter().any(|(_, _, fails)| *fails);
        match outcome {
            Ok(results) => {
                prop_assert!(!any_failing);
                prop_assert_eq!(results.len(), 4);
            }
            Err(failure) => {
                prop_assert!(any_failing);
                prop_assert!(failure.cause.is_root_cause());
                let failed: BTreeSet<StageId> = failure.failed_stages().into_iter().collect();
                prop_assert_eq!(failed.len(), failure.failures.len());

                // Anything whose prerequisites failed never ran.
                for (stage, prerequisites, _) in &dag {
                    if prerequisites.iter().any(|p| failed.contains(p)) {
                        prop_assert!(failed.contains(stage));
                        prop_assert!(!probe.was_started(*stage));
                    }
                }
            }
        }
    }
}
