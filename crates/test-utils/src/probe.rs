use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docdag::dag::{OperationError, Results, StageFuture, StageId, StageOperation, Task};

/// Tasks in scheduler tests carry no input and produce strings.
pub type TestTask = Task<(), String>;

/// What a probe operation does once it starts.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Sleep for the given time, then succeed with `"<stage>-done"`.
    Succeed(Duration),
    /// Sleep for the given time, then fail with the given message.
    Fail(Duration, String),
    /// Panic immediately.
    Panic,
    /// Never finish.
    Hang,
}

/// Shared record of what the operations in a run observed.
#[derive(Debug, Default)]
pub struct Probe {
    running: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<StageId>>,
    finished: Mutex<Vec<StageId>>,
    seen: Mutex<BTreeMap<StageId, Vec<StageId>>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build a task for `stage` whose operation reports to this probe.
    pub fn task(self: &Arc<Self>, stage: StageId, behaviour: Behaviour) -> TestTask {
        let op: Arc<dyn StageOperation<(), String>> = Arc::new(ProbeOperation {
            probe: Arc::clone(self),
            stage,
            behaviour,
        });
        Task::new(stage, op, Arc::new(()))
    }

    /// Highest number of operations observed running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Stages whose operation started, in start order.
    pub fn started(&self) -> Vec<StageId> {
        self.started.lock().unwrap().clone()
    }

    /// Stages whose operation ran to completion (success or failure).
    pub fn finished(&self) -> Vec<StageId> {
        self.finished.lock().unwrap().clone()
    }

    /// Stages present in the results snapshot handed to `stage`.
    pub fn seen_by(&self, stage: StageId) -> Option<Vec<StageId>> {
        self.seen.lock().unwrap().get(&stage).cloned()
    }

    pub fn was_started(&self, stage: StageId) -> bool {
        self.started().contains(&stage)
    }
}

struct ProbeOperation {
    probe: Arc<Probe>,
    stage: StageId,
    behaviour: Behaviour,
}

impl StageOperation<(), String> for ProbeOperation {
    fn run(&self, _input: Arc<()>, results: Results<String>) -> StageFuture<String> {
        let probe = Arc::clone(&self.probe);
        let stage = self.stage;
        let behaviour = self.behaviour.clone();

        Box::pin(async move {
            probe.started.lock().unwrap().push(stage);
            probe
                .seen
                .lock()
                .unwrap()
                .insert(stage, results.keys().copied().collect());

            let now = probe.running.fetch_add(1, Ordering::SeqCst) + 1;
            probe.peak.fetch_max(now, Ordering::SeqCst);

            let outcome = match behaviour {
                Behaviour::Succeed(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(format!("{stage}-done"))
                }
                Behaviour::Fail(delay, message) => {
                    tokio::time::sleep(delay).await;
                    Err(OperationError::new(message))
                }
                Behaviour::Panic => {
                    probe.running.fetch_sub(1, Ordering::SeqCst);
                    panic!("probe panic in {stage}");
                }
                Behaviour::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            };

            probe.running.fetch_sub(1, Ordering::SeqCst);
            probe.finished.lock().unwrap().push(stage);
            outcome
        })
    }
}
