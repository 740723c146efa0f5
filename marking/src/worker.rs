use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use db::models::grading_unit::{self, GradingUnitStatus};
use futures::FutureExt;
use marker::error::MarkerError;
use marker::{CriterionInput, StrategyRegistry};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;

use crate::candidates::CandidateSet;
use crate::error::MarkingError;
use crate::manager::queue::WorkQueue;
use crate::node::{self, NodeState};

/// What happened to one dequeued unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The strategy marked it.
    Marked { mark: i32 },
    /// Handed to a human.
    ManualMarking { reason: String },
    /// It was no longer claimed, e.g. resolved by another node after a
    /// timeout, so nothing was written.
    Skipped,
}

/// Why automatic marking gave up on a unit.
enum Failure {
    NoStrategy,
    Strategy(MarkerError),
    MarkOutOfRange(i32),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::NoStrategy => write!(f, "no grading strategy registered"),
            Failure::Strategy(e) => write!(f, "{e}"),
            Failure::MarkOutOfRange(mark) => write!(f, "strategy returned mark {mark} outside 0..=100"),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One member of the worker pool.
pub struct Worker {
    pub(crate) index: usize,
    pub(crate) db: DatabaseConnection,
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) registry: Arc<StrategyRegistry>,
    pub(crate) candidates: CandidateSet,
    pub(crate) wake_poller: Arc<Notify>,
}

impl Worker {
    pub fn new(
        index: usize,
        db: DatabaseConnection,
        queue: Arc<WorkQueue>,
        registry: Arc<StrategyRegistry>,
        candidates: CandidateSet,
        wake_poller: Arc<Notify>,
    ) -> Self {
        Self {
            index,
            db,
            queue,
            registry,
            candidates,
            wake_poller,
        }
    }

    /// Drains the queue until `cancel` fires.
    pub async fn run(self, mut node: watch::Receiver<NodeState>, cancel: CancellationToken) {
        if !node::wait_until_running(&mut node, &cancel).await {
            return;
        }
        tracing::debug!(worker = self.index, "Marking worker started");

        while let Some(unit_id) = self.queue.pop(&cancel).await {
            match AssertUnwindSafe(self.process(unit_id)).catch_unwind().await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::error!(
                        worker = self.index,
                        unit_id,
                        error = %e,
                        "Failed to process grading unit"
                    );
                }
                // The unit stays claimed and is reclaimed after the work timeout.
                Err(payload) => {
                    tracing::error!(
                        worker = self.index,
                        unit_id,
                        panic = %panic_message(payload),
                        "Grading unit processing panicked"
                    );
                }
            }
        }

        tracing::debug!(worker = self.index, "Marking worker stopped");
    }

    /// Marks one claimed unit and records the outcome.
    ///
    /// The strategy runs without any store lock held. A missing strategy, a
    /// strategy error or a strategy panic all park the unit for manual
    /// marking. Either way the parent submission becomes an aggregation
    /// candidate and the poller is woken.
    pub async fn process(&self, unit_id: i64) -> Result<UnitOutcome, MarkingError> {
        let ctx = grading_unit::Model::load_context(&self.db, unit_id).await?;
        if ctx.unit.status != GradingUnitStatus::Claimed {
            tracing::debug!(
                worker = self.index,
                unit_id,
                status = %ctx.unit.status,
                "Skipping grading unit that is no longer claimed"
            );
            return Ok(UnitOutcome::Skipped);
        }

        let submission_id = ctx.answer.submission_id;
        let strategy_id = ctx.criterion.strategy_id.clone();
        let input = CriterionInput {
            unit_id,
            criterion_id: ctx.criterion.id,
            strategy_id: strategy_id.clone(),
            config: ctx.criterion.config,
            answered: ctx.answer.answered,
            answer: ctx.answer.answer,
        };

        let attempt = match self.registry.get(&strategy_id) {
            None => Err(Failure::NoStrategy),
            Some(strategy) => match AssertUnwindSafe(async { strategy.mark(&input).await })
                .catch_unwind()
                .await
            {
                Ok(Ok(outcome)) if (0..=100).contains(&outcome.mark) => Ok(outcome),
                Ok(Ok(outcome)) => Err(Failure::MarkOutOfRange(outcome.mark)),
                Ok(Err(e)) => Err(Failure::Strategy(e)),
                Err(payload) => Err(Failure::Strategy(MarkerError::Panicked(panic_message(
                    payload,
                )))),
            },
        };

        let outcome = match attempt {
            Ok(outcome) => {
                if !grading_unit::Model::complete(
                    &self.db,
                    unit_id,
                    outcome.mark,
                    Some(outcome.result),
                    Utc::now(),
                )
                .await?
                {
                    return Ok(UnitOutcome::Skipped);
                }
                tracing::info!(
                    worker = self.index,
                    unit_id,
                    submission_id,
                    strategy_id = %strategy_id,
                    mark = outcome.mark,
                    "Grading unit marked"
                );
                UnitOutcome::Marked { mark: outcome.mark }
            }
            Err(failure) => {
                let reason = failure.to_string();
                if !grading_unit::Model::mark_for_manual(
                    &self.db,
                    unit_id,
                    Some(json!({ "reason": reason })),
                    Utc::now(),
                )
                .await?
                {
                    return Ok(UnitOutcome::Skipped);
                }
                tracing::warn!(
                    worker = self.index,
                    unit_id,
                    submission_id,
                    strategy_id = %strategy_id,
                    reason = %reason,
                    "Grading unit needs manual marking"
                );
                UnitOutcome::ManualMarking { reason }
            }
        };

        self.candidates.insert(submission_id);
        self.wake_poller.notify_one();
        Ok(outcome)
    }
}
