// tests/scheduler_behaviour.rs

use std::time::Duration;

use docdag::dag::{FailureCause, OperationError, Scheduler, SchedulerOptions, StageId, TaskGraph};
use docdag::types::FailurePolicy;
use docdag_test_utils::init_tracing;
use docdag_test_utils::probe::{Behaviour, Probe};

use StageId::{Analysis, ApiDocs, Architecture, Readme};

fn scheduler(max_parallel: usize, timeout: Duration, on_failure: FailurePolicy) -> Scheduler {
    Scheduler::new(SchedulerOptions {
        max_parallel,
        dependency_timeout: timeout,
        on_failure,
    })
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn fan_out_completes_under_a_single_slot() {
    init_tracing();
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Readme, Behaviour::Succeed(ms(10))).after(Analysis),
        probe.task(ApiDocs, Behaviour::Succeed(ms(10))).after(Analysis),
        probe.task(Analysis, Behaviour::Succeed(ms(10))),
    ])
    .unwrap();

    let results = scheduler(1, Duration::from_secs(300), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[&Analysis], "analysis-done");
    assert_eq!(probe.started()[0], Analysis);
    assert_eq!(probe.peak(), 1);
    assert!(probe.seen_by(ApiDocs).unwrap().contains(&Analysis));
    assert!(probe.seen_by(Readme).unwrap().contains(&Analysis));
    assert!(probe.seen_by(Analysis).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrency_never_exceeds_the_limit() {
    init_tracing();
    let probe = Probe::new();
    let graph = TaskGraph::new(
        StageId::ALL
            .into_iter()
            .map(|stage| probe.task(stage, Behaviour::Succeed(ms(50))))
            .collect(),
    )
    .unwrap();

    let results = scheduler(2, Duration::from_secs(300), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(probe.peak(), 2);
    assert_eq!(probe.finished().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn independent_tasks_run_in_parallel() {
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Succeed(ms(100))),
        probe.task(Architecture, Behaviour::Succeed(ms(100))),
    ])
    .unwrap();

    let started = tokio::time::Instant::now();
    scheduler(3, Duration::from_secs(300), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap();

    assert_eq!(probe.peak(), 2);
    assert!(started.elapsed() < ms(200));
}

#[tokio::test(start_paused = true)]
async fn failed_prerequisite_fails_dependents_without_running_them() {
    init_tracing();
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Fail(ms(5), "model unavailable".to_string())),
        probe.task(ApiDocs, Behaviour::Succeed(ms(5))).after(Analysis),
        probe.task(Readme, Behaviour::Succeed(ms(5))).after(Analysis),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(300), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Analysis);
    assert_eq!(
        failure.cause,
        FailureCause::Operation(OperationError::new("model unavailable"))
    );
    for dependent in [ApiDocs, Readme] {
        assert_eq!(
            failure.cause_of(dependent),
            Some(&FailureCause::DependencyFailed {
                failed: vec![Analysis]
            })
        );
        assert!(!probe.was_started(dependent));
    }
    assert_eq!(failure.failures.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn dependency_failure_propagates_transitively() {
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Fail(ms(1), "boom".to_string())),
        probe.task(ApiDocs, Behaviour::Succeed(ms(1))).after(Analysis),
        probe.task(Readme, Behaviour::Succeed(ms(1))).after(ApiDocs),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(300), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Analysis);
    assert_eq!(
        failure.cause_of(Readme),
        Some(&FailureCause::DependencyFailed {
            failed: vec![ApiDocs]
        })
    );
    assert_eq!(failure.failed_stages(), vec![Analysis, ApiDocs, Readme]);
}

#[tokio::test(start_paused = true)]
async fn slow_prerequisite_times_out_dependent() {
    init_tracing();
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Succeed(Duration::from_secs(10))),
        probe.task(Readme, Behaviour::Succeed(ms(1))).after(Analysis),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(1), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Readme);
    assert_eq!(
        failure.cause,
        FailureCause::Timeout {
            missing: vec![Analysis],
            waited: Duration::from_secs(1),
        }
    );
    // Drain lets the slow prerequisite finish even though the run fails.
    assert_eq!(probe.finished(), vec![Analysis]);
    assert!(!probe.was_started(Readme));
}

#[tokio::test(start_paused = true)]
async fn cancel_policy_aborts_hung_siblings() {
    init_tracing();
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Hang),
        probe.task(Readme, Behaviour::Succeed(ms(1))).after(Analysis),
    ])
    .unwrap();

    let started = tokio::time::Instant::now();
    let failure = scheduler(3, Duration::from_secs(1), FailurePolicy::Cancel)
        .run(graph)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(failure.stage, Readme);
    assert!(matches!(failure.cause, FailureCause::Timeout { .. }));
    assert_eq!(failure.cause_of(Analysis), Some(&FailureCause::Cancelled));
    // The deadline fires once and the run ends with it.
    assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(1) + ms(10), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn drain_policy_lets_unrelated_tasks_finish() {
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Fail(ms(10), "boom".to_string())),
        probe.task(Architecture, Behaviour::Succeed(ms(100))),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(300), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.failed_stages(), vec![Analysis]);
    assert!(probe.finished().contains(&Architecture));
}

#[tokio::test(start_paused = true)]
async fn cancel_policy_stops_unrelated_tasks() {
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Fail(ms(10), "boom".to_string())),
        probe.task(Architecture, Behaviour::Hang),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(300), FailurePolicy::Cancel)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Analysis);
    assert_eq!(failure.cause_of(Architecture), Some(&FailureCause::Cancelled));
    assert!(!probe.finished().contains(&Architecture));
}

#[tokio::test]
async fn panicking_operation_fails_its_stage() {
    init_tracing();
    let probe = Probe::new();
    let graph = TaskGraph::new(vec![
        probe.task(Analysis, Behaviour::Panic),
        probe.task(ApiDocs, Behaviour::Succeed(ms(1))).after(Analysis),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(5), FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Analysis);
    assert_eq!(
        failure.cause,
        FailureCause::Operation(OperationError::new("operation panicked"))
    );
    assert_eq!(
        failure.cause_of(ApiDocs),
        Some(&FailureCause::DependencyFailed {
            failed: vec![Analysis]
        })
    );
}

#[tokio::test(start_paused = true)]
async fn scheduler_can_be_reused_across_runs() {
    let sched = scheduler(2, Duration::from_secs(300), FailurePolicy::Drain);

    for _ in 0..2 {
        let probe = Probe::new();
        let graph = TaskGraph::new(vec![
            probe.task(Analysis, Behaviour::Succeed(ms(1))),
            probe.task(Readme, Behaviour::Succeed(ms(1))).after(Analysis),
        ])
        .unwrap();

        let results = sched.run(graph).await.unwrap();
        assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![Analysis, Readme]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_policy_still_reports_dependency_failures() {
    init_tracing();
    // Aborted dependents must be attributed to the failed prerequisite no
    // matter which order the runtime hands back their join results.
    for _ in 0..100 {
        let recorder = Probe::new();
        let graph = TaskGraph::new(vec![
            recorder.task(Analysis, Behaviour::Fail(ms(0), "boom".to_string())),
            recorder.task(ApiDocs, Behaviour::Succeed(ms(1))).after(Analysis),
            recorder.task(Readme, Behaviour::Succeed(ms(1))).after(Analysis),
        ])
        .unwrap();

        let failure = scheduler(3, Duration::from_secs(300), FailurePolicy::Cancel)
            .run(graph)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Analysis);
        for dependent in [ApiDocs, Readme] {
            assert_eq!(
                failure.cause_of(dependent),
                Some(&FailureCause::DependencyFailed {
                    failed: vec![Analysis]
                })
            );
            assert!(!recorder.was_started(dependent));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_policy_attributes_transitive_waiters() {
    let recorder = Probe::new();
    let graph = TaskGraph::new(vec![
        recorder.task(Analysis, Behaviour::Fail(ms(10), "boom".to_string())),
        recorder.task(Architecture, Behaviour::Hang),
        recorder.task(Readme, Behaviour::Succeed(ms(1))).after(Architecture),
    ])
    .unwrap();

    let failure = scheduler(3, Duration::from_secs(300), FailurePolicy::Cancel)
        .run(graph)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Analysis);
    assert_eq!(failure.cause_of(Architecture), Some(&FailureCause::Cancelled));
    assert_eq!(
        failure.cause_of(Readme),
        Some(&FailureCause::DependencyFailed {
            failed: vec![Architecture]
        })
    );
}

#[tokio::test(start_paused = true)]
async fn unbounded_dependency_timeout_waits_for_prerequisites() {
    let recorder = Probe::new();
    let graph = TaskGraph::new(vec![
        recorder.task(Analysis, Behaviour::Succeed(Duration::from_secs(10))),
        recorder.task(Readme, Behaviour::Succeed(ms(1))).after(Analysis),
    ])
    .unwrap();

    let results = scheduler(3, Duration::MAX, FailurePolicy::Drain)
        .run(graph)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(recorder.finished(), vec![Analysis, Readme]);
}
