//! Automatic submission of attempts whose assignment deadline has passed.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, TransactionTrait};

use crate::models::{
    assignment,
    assignment_submission::{self, SubmissionStatus},
    grading_unit, node_lock,
};

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Assignments flagged as handled.
    pub assignments: Vec<i64>,
    /// Submissions moved from `Active` to `Submitted`.
    pub submitted: Vec<i64>,
    /// Grading units materialized for those submissions.
    pub units_created: usize,
}

/// Submits every active attempt of every assignment whose due date lies before
/// `now` and has not been handled yet.
///
/// Runs as one transaction inside the marking exclusive section: either all
/// of it is applied or none of it. Handled assignments are skipped on later
/// sweeps, so running it again is a no-op until a due date moves.
pub async fn sweep_past_due(
    db: &DatabaseConnection,
    holder: &str,
    now: DateTime<Utc>,
) -> Result<SweepReport, DbErr> {
    let txn = db.begin().await?;
    node_lock::acquire(&txn, node_lock::MARKING_LOCK, holder, now).await?;

    let due = assignment::Model::find_past_due(&txn, now).await?;
    let mut report = SweepReport::default();

    for a in due {
        assignment::ActiveModel {
            id: Set(a.id),
            due_handled: Set(true),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        report.assignments.push(a.id);

        let active = assignment_submission::Entity::find()
            .filter(assignment_submission::Column::AssignmentId.eq(a.id))
            .filter(assignment_submission::Column::Status.eq(SubmissionStatus::Active))
            .all(&txn)
            .await?;

        for submission in active {
            if !assignment_submission::Model::transition_to_submitted(&txn, submission.id, now)
                .await?
            {
                continue;
            }
            let units = grading_unit::Model::create_for_submission(&txn, submission.id, now).await?;
            tracing::info!(
                assignment_id = a.id,
                submission_id = submission.id,
                units,
                "Submission auto-submitted at due date"
            );
            report.submitted.push(submission.id);
            report.units_created += units;
        }
    }

    txn.commit().await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grading_unit::GradingUnitStatus;
    use crate::test_utils::{seed_single_question, setup_test_db};
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn sweep_submits_past_due_attempts_once() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", Some(json!("x"))).await;
        let now = Utc::now();
        assignment::Model::set_due_date(&db, seeded.assignment_id, Some(now - Duration::minutes(1)))
            .await
            .unwrap();

        let first = sweep_past_due(&db, "node-a", now).await.unwrap();
        assert_eq!(first.assignments, vec![seeded.assignment_id]);
        assert_eq!(first.submitted, vec![seeded.submission_id]);
        assert_eq!(first.units_created, 1);

        let second = sweep_past_due(&db, "node-a", now).await.unwrap();
        assert_eq!(second, SweepReport::default(), "second sweep must be a no-op");

        let units = grading_unit::Model::get_by_submission_id(&db, seeded.submission_id)
            .await
            .unwrap();
        assert_eq!(units.len(), 1, "no duplicate grading units");
        assert_eq!(units[0].status, GradingUnitStatus::AwaitingMarking);

        let submission = assignment_submission::Model::get_by_id(&db, seeded.submission_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(submission.status, SubmissionStatus::Submitted);
        assert!(submission.time_end.is_some());
    }

    #[tokio::test]
    async fn sweep_ignores_future_and_missing_due_dates() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", Some(json!("x"))).await;
        let now = Utc::now();

        let report = sweep_past_due(&db, "node-a", now).await.unwrap();
        assert!(report.assignments.is_empty());

        assignment::Model::set_due_date(&db, seeded.assignment_id, Some(now + Duration::hours(1)))
            .await
            .unwrap();
        let report = sweep_past_due(&db, "node-a", now).await.unwrap();
        assert!(report.assignments.is_empty());
    }
}
