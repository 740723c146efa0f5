// manager/manager.rs
use std::sync::Arc;

use marker::StrategyRegistry;
use sea_orm::DatabaseConnection;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::candidates::CandidateSet;
use crate::config::MarkingConfig;
use crate::manager::queue::WorkQueue;
use crate::node::NodeState;
use crate::poller::Poller;
use crate::worker::Worker;

/// Outcome of [`MarkingManager::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Claimed units still queued when the node stopped. They stay `Claimed`
    /// in the store and are reclaimed by any node after the work timeout.
    pub abandoned: Vec<i64>,
    /// Tasks that ended in a panic.
    pub panicked: usize,
}

/// Owns the poller and the worker pool of one node.
pub struct MarkingManager {
    config: Arc<MarkingConfig>,
    queue: Arc<WorkQueue>,
    candidates: CandidateSet,
    wake: Arc<Notify>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MarkingManager {
    /// Spawns the poller and `config.workers` workers.
    ///
    /// Nothing touches the store until `node` reports `Running`.
    pub fn start(
        config: MarkingConfig,
        db: DatabaseConnection,
        registry: StrategyRegistry,
        node: watch::Receiver<NodeState>,
    ) -> Self {
        let config = Arc::new(config.clamped());
        let queue = Arc::new(WorkQueue::new(config.queue_capacity));
        let registry = Arc::new(registry);
        let candidates = CandidateSet::new();
        let wake = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let mut tasks = Vec::with_capacity(config.workers + 1);

        let poller = Poller::new(
            db.clone(),
            Arc::clone(&config),
            Arc::clone(&queue),
            candidates.clone(),
            Arc::clone(&wake),
        );
        tasks.push(tokio::spawn(poller.run(node.clone(), cancel.clone())));

        for index in 0..config.workers {
            let worker = Worker::new(
                index,
                db.clone(),
                Arc::clone(&queue),
                Arc::clone(&registry),
                candidates.clone(),
                Arc::clone(&wake),
            );
            tasks.push(tokio::spawn(worker.run(node.clone(), cancel.clone())));
        }

        tracing::info!(
            node_id = %config.node_id,
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            strategies = ?registry.ids(),
            "Marking manager started"
        );

        Self {
            config,
            queue,
            candidates,
            wake,
            cancel,
            tasks,
        }
    }

    /// Ends the poller's current pause early.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Makes `submission_id` an aggregation candidate and wakes the poller.
    /// Used after a manual mark changes a unit outside the worker pool.
    pub fn request_aggregation(&self, submission_id: i64) {
        self.candidates.insert(submission_id);
        self.wake();
    }

    /// Stops the poller and the workers and waits for them.
    ///
    /// Workers finish the unit they hold; queued units are dropped from
    /// memory only.
    pub async fn shutdown(self) -> ShutdownReport {
        self.cancel.cancel();

        let mut report = ShutdownReport::default();
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                if e.is_panic() {
                    report.panicked += 1;
                }
                tracing::error!(error = %e, "Marking task ended abnormally");
            }
        }

        report.abandoned = self.queue.drain();
        tracing::info!(
            node_id = %self.config.node_id,
            abandoned = report.abandoned.len(),
            "Marking manager stopped"
        );
        report
    }
}
