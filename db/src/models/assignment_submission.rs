use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, DatabaseTransaction, QueryOrder, TransactionTrait,
};

use crate::error::PersistError;
use crate::models::{grading_unit, node_lock};

/// Represents the status of a submission throughout its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "submission_status_enum"
)]
pub enum SubmissionStatus {
    /// Learner is still answering
    #[sea_orm(string_value = "active")]
    Active,
    /// Answers are frozen and grading units exist
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Every grading unit is resolved and the mark is being computed
    #[sea_orm(string_value = "marking")]
    Marking,
    /// Final mark persisted
    #[sea_orm(string_value = "marked")]
    Marked,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status_str = match self {
            SubmissionStatus::Active => "active",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Marking => "marking",
            SubmissionStatus::Marked => "marked",
        };
        write!(f, "{}", status_str)
    }
}

/// One learner attempt at an assignment.
///
/// `mark` stays `None` until the aggregator has computed it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignment_submissions")]
pub struct Model {
    /// Primary key of the submission.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the related assignment.
    pub assignment_id: i64,
    /// ID of the learner making the attempt.
    pub user_id: i64,
    /// Current status of the submission in the lifecycle.
    pub status: SubmissionStatus,
    /// Final mark on a 0..=100 scale.
    pub mark: Option<f64>,
    /// When the attempt was started.
    pub time_start: DateTime<Utc>,
    /// When the attempt was submitted, by the learner or the due-date sweep.
    pub time_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Defines relationships between `assignment_submissions` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the related assignment.
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,

    /// Answers given in this attempt.
    #[sea_orm(has_many = "super::submission_answer::Entity")]
    Answers,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::submission_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Starts a new attempt for `user_id`.
    pub async fn create(
        db: &DatabaseConnection,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Self, PersistError> {
        if super::assignment::Entity::find_by_id(assignment_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(PersistError::AssignmentNotFound(assignment_id));
        }

        let now = Utc::now();
        let active = ActiveModel {
            assignment_id: Set(assignment_id),
            user_id: Set(user_id),
            status: Set(SubmissionStatus::Active),
            mark: Set(None),
            time_start: Set(now),
            time_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(db).await?)
    }

    pub async fn get_by_id<C>(conn: &C, id: i64) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id).one(conn).await
    }

    pub async fn get_by_assignment_id(
        db: &DatabaseConnection,
        assignment_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Learner-driven submission.
    ///
    /// Freezes the answers and creates the grading units. The host should wake
    /// the marking poller afterwards so the units are claimed without waiting
    /// for the next poll interval.
    pub async fn submit(
        db: &DatabaseConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<(Self, usize), PersistError> {
        let txn = db.begin().await?;
        node_lock::acquire(&txn, node_lock::MARKING_LOCK, "submit", now).await?;

        let Some(submission) = Self::get_by_id(&txn, id).await? else {
            return Err(PersistError::SubmissionNotFound(id));
        };
        if submission.status != SubmissionStatus::Active {
            return Err(PersistError::InvalidState {
                expected: SubmissionStatus::Active.to_string(),
                found: submission.status.to_string(),
            });
        }

        Self::transition_to_submitted(&txn, id, now).await?;
        let units = grading_unit::Model::create_for_submission(&txn, id, now).await?;

        let submitted = Self::get_by_id(&txn, id)
            .await?
            .ok_or(PersistError::SubmissionNotFound(id))?;
        txn.commit().await?;

        Ok((submitted, units))
    }

    /// `Active -> Submitted` as a conditional update. Returns `false` when the
    /// submission was no longer active.
    pub(crate) async fn transition_to_submitted(
        txn: &DatabaseTransaction,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .set(ActiveModel {
                status: Set(SubmissionStatus::Submitted),
                time_end: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(SubmissionStatus::Active))
            .exec(txn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Moves a submission to `Marking` once none of its grading units are
    /// awaiting marking or claimed.
    ///
    /// Runs inside the marking exclusive section. Returns the submission when
    /// it is ready for aggregation, `None` when it still has outstanding work
    /// or is not in a state that can be aggregated.
    pub async fn begin_marking_if_complete(
        db: &DatabaseConnection,
        holder: &str,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        let txn = db.begin().await?;
        node_lock::acquire(&txn, node_lock::MARKING_LOCK, holder, now).await?;

        let Some(submission) = Self::get_by_id(&txn, id).await? else {
            txn.commit().await?;
            return Ok(None);
        };
        if !matches!(
            submission.status,
            SubmissionStatus::Submitted | SubmissionStatus::Marking
        ) {
            txn.commit().await?;
            return Ok(None);
        }

        if grading_unit::Model::count_unresolved(&txn, id).await? > 0 {
            txn.commit().await?;
            return Ok(None);
        }

        let submission = if submission.status == SubmissionStatus::Marking {
            submission
        } else {
            ActiveModel {
                id: Set(id),
                status: Set(SubmissionStatus::Marking),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(&txn)
            .await?
        };
        txn.commit().await?;

        Ok(Some(submission))
    }

    /// Submissions that may still need aggregation: submitted ones whose
    /// units could all be resolved already, and ones left in `Marking` by a
    /// node that stopped between starting and finishing an aggregation.
    pub async fn find_awaiting_aggregation(db: &DatabaseConnection) -> Result<Vec<i64>, DbErr> {
        let rows = Entity::find()
            .filter(
                Column::Status.is_in([SubmissionStatus::Submitted, SubmissionStatus::Marking]),
            )
            .order_by_asc(Column::Id)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|s| s.id).collect())
    }

    pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<(), PersistError> {
        let result = Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(PersistError::SubmissionNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grading_unit::GradingUnitStatus;
    use crate::test_utils::{seed_single_question, setup_test_db};
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn submit_creates_units_once() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", Some(json!("x"))).await;

        let (submitted, units) = Model::submit(&db, seeded.submission_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(submitted.status, SubmissionStatus::Submitted);
        assert!(submitted.time_end.is_some());
        assert_eq!(units, 1);

        let err = Model::submit(&db, seeded.submission_id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::InvalidState { .. }));

        let units = grading_unit::Model::get_by_submission_id(&db, seeded.submission_id)
            .await
            .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].status, GradingUnitStatus::AwaitingMarking);
    }

    #[tokio::test]
    async fn marking_only_begins_once_every_unit_is_resolved() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", Some(json!("x"))).await;
        let now = Utc::now();

        // Active submissions are never aggregated.
        assert!(
            Model::begin_marking_if_complete(&db, "node-a", seeded.submission_id, now)
                .await
                .unwrap()
                .is_none()
        );

        Model::submit(&db, seeded.submission_id, now).await.unwrap();
        assert_eq!(
            Model::find_awaiting_aggregation(&db).await.unwrap(),
            vec![seeded.submission_id]
        );
        assert!(
            Model::begin_marking_if_complete(&db, "node-a", seeded.submission_id, now)
                .await
                .unwrap()
                .is_none(),
            "unit still awaiting marking"
        );

        let claimed = grading_unit::Model::claim_batch(
            &db,
            "node-a",
            1,
            Duration::seconds(60),
            Default::default(),
            now,
        )
        .await
        .unwrap();
        grading_unit::Model::complete(&db, claimed[0].id, 100, None, now)
            .await
            .unwrap();

        let started = Model::begin_marking_if_complete(&db, "node-a", seeded.submission_id, now)
            .await
            .unwrap()
            .expect("all units resolved");
        assert_eq!(started.status, SubmissionStatus::Marking);
    }
}
