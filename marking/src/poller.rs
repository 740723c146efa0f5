use std::sync::Arc;

use chrono::{DateTime, Utc};
use db::due_dates;
use db::grade;
use db::models::assignment_submission;
use db::models::grading_unit;
use sea_orm::DatabaseConnection;
use tokio::sync::{Notify, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::candidates::CandidateSet;
use crate::config::{MIN_CYCLE_GAP, MarkingConfig};
use crate::error::MarkingError;
use crate::manager::queue::WorkQueue;
use crate::node::{self, NodeState};

/// What one poller cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Submissions moved to `Submitted` by the due-date sweep.
    pub auto_submitted: Vec<i64>,
    /// Submissions whose final mark was stored, with the mark.
    pub aggregated: Vec<(i64, f64)>,
    /// Units claimed and enqueued.
    pub claimed: Vec<i64>,
}

/// The single coordinator task of a node.
///
/// Each cycle runs three phases in order: the due-date sweep, aggregation of
/// candidate submissions, then refilling the queue with newly claimed units.
pub struct Poller {
    pub(crate) db: DatabaseConnection,
    pub(crate) config: Arc<MarkingConfig>,
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) candidates: CandidateSet,
    pub(crate) wake: Arc<Notify>,
}

impl Poller {
    pub fn new(
        db: DatabaseConnection,
        config: Arc<MarkingConfig>,
        queue: Arc<WorkQueue>,
        candidates: CandidateSet,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            db,
            config,
            queue,
            candidates,
            wake,
        }
    }

    pub async fn run(self, mut node: watch::Receiver<NodeState>, cancel: CancellationToken) {
        if !node::wait_until_running(&mut node, &cancel).await {
            return;
        }

        // Submissions left half-aggregated by a previous run.
        match assignment_submission::Model::find_awaiting_aggregation(&self.db).await {
            Ok(ids) => {
                if !ids.is_empty() {
                    tracing::info!(count = ids.len(), "Resuming aggregation candidates");
                }
                self.candidates.extend(ids);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load aggregation candidates");
            }
        }

        tracing::info!(
            node_id = %self.config.node_id,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Marking poller started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.run_cycle(Utc::now()).await {
                tracing::error!(error = %e, "Marking cycle failed");
            }
            if !self.pause(&cancel).await {
                break;
            }
        }

        tracing::info!(node_id = %self.config.node_id, "Marking poller stopped");
    }

    /// Runs one full cycle as of `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, MarkingError> {
        let mut report = CycleReport::default();

        let sweep = due_dates::sweep_past_due(&self.db, &self.config.node_id, now).await?;
        self.candidates.extend(sweep.submitted.iter().copied());
        report.auto_submitted = sweep.submitted;

        report.aggregated = self.aggregate(now).await?;
        report.claimed = self.refill(now).await?;

        Ok(report)
    }

    async fn aggregate(&self, now: DateTime<Utc>) -> Result<Vec<(i64, f64)>, MarkingError> {
        let mut aggregated = Vec::new();
        let pending = self.candidates.drain();

        for (i, submission_id) in pending.iter().copied().enumerate() {
            let started = match assignment_submission::Model::begin_marking_if_complete(
                &self.db,
                &self.config.node_id,
                submission_id,
                now,
            )
            .await
            {
                Ok(started) => started,
                Err(e) => {
                    // Keep this and every untried candidate for the next cycle.
                    self.candidates.extend(pending[i..].iter().copied());
                    return Err(e.into());
                }
            };
            if started.is_none() {
                continue;
            }

            match grade::compute_submission_mark(&self.db, submission_id).await {
                Ok(mark) => {
                    tracing::info!(submission_id, mark, "Submission marked");
                    aggregated.push((submission_id, mark));
                }
                Err(e) => {
                    tracing::warn!(
                        submission_id,
                        error = %e,
                        "Failed to compute submission mark, will retry"
                    );
                    self.candidates.insert(submission_id);
                }
            }
        }

        Ok(aggregated)
    }

    async fn refill(&self, now: DateTime<Utc>) -> Result<Vec<i64>, MarkingError> {
        let free = self.queue.free_slots();
        if free == 0 {
            return Ok(Vec::new());
        }

        let units = grading_unit::Model::claim_batch(
            &self.db,
            &self.config.node_id,
            free,
            self.config.claim_timeout(),
            self.config.claim_order,
            now,
        )
        .await?;

        let mut claimed = Vec::with_capacity(units.len());
        for unit in units {
            if self.queue.push_unique(unit.id) {
                claimed.push(unit.id);
            }
        }

        if !claimed.is_empty() {
            tracing::info!(
                node_id = %self.config.node_id,
                count = claimed.len(),
                "Claimed grading units"
            );
        }
        Ok(claimed)
    }

    /// Sleeps until the poll interval elapses or a worker wakes the poller.
    /// Returns `false` when cancelled.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = sleep(self.config.poll_interval) => {}
            _ = self.wake.notified() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = sleep(MIN_CYCLE_GAP) => true,
        }
    }
}
