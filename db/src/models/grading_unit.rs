use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::Set, Condition, ConnectionTrait, PaginatorTrait, QueryOrder, QuerySelect,
    TransactionTrait,
};

use crate::error::{PersistError, check_mark};
use crate::models::{
    assignment_submission::{self, SubmissionStatus},
    node_lock, question_criterion, submission_answer,
};

/// Lifecycle of a grading unit.
///
/// `AwaitingMarking -> Claimed -> Marked | AwaitingManualMarking`. A claimed
/// unit whose claim has expired is picked up again by the next claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "grading_unit_status_enum"
)]
pub enum GradingUnitStatus {
    #[sea_orm(string_value = "awaiting_marking")]
    AwaitingMarking,
    #[sea_orm(string_value = "claimed")]
    Claimed,
    #[sea_orm(string_value = "marked")]
    Marked,
    /// Needs a human; never retried automatically.
    #[sea_orm(string_value = "awaiting_manual_marking")]
    AwaitingManualMarking,
}

impl GradingUnitStatus {
    /// `Marked` and `AwaitingManualMarking` end automatic processing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Marked | Self::AwaitingManualMarking)
    }
}

impl Default for GradingUnitStatus {
    fn default() -> Self {
        Self::AwaitingMarking
    }
}

impl std::fmt::Display for GradingUnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status_str = match self {
            GradingUnitStatus::AwaitingMarking => "awaiting_marking",
            GradingUnitStatus::Claimed => "claimed",
            GradingUnitStatus::Marked => "marked",
            GradingUnitStatus::AwaitingManualMarking => "awaiting_manual_marking",
        };
        write!(f, "{}", status_str)
    }
}

/// Order in which eligible units are claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimOrder {
    /// Oldest-created first. Starvation free.
    #[default]
    OldestFirst,
    NewestFirst,
}

impl FromStr for ClaimOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest" | "oldest_first" => Ok(Self::OldestFirst),
            "newest" | "newest_first" => Ok(Self::NewestFirst),
            other => Err(format!("unknown claim order '{other}'")),
        }
    }
}

/// One criterion of one answered question: the atomic piece of grading work.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grading_units")]
pub struct Model {
    /// Primary key of the unit.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Answer being graded.
    pub answer_id: i64,
    /// Criterion the answer is graded against.
    pub criterion_id: i64,
    pub status: GradingUnitStatus,
    /// Set while `Claimed`; drives stale-claim reclamation.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Node holding the claim. Informational.
    pub claimed_by: Option<String>,
    /// Criterion-local mark, 0..=100.
    pub mark: i32,
    /// Strategy output shown to learners and markers.
    pub result: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submission_answer::Entity",
        from = "Column::AnswerId",
        to = "super::submission_answer::Column::Id"
    )]
    Answer,
    #[sea_orm(
        belongs_to = "super::question_criterion::Entity",
        from = "Column::CriterionId",
        to = "super::question_criterion::Column::Id"
    )]
    Criterion,
}

impl Related<super::submission_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answer.def()
    }
}

impl Related<super::question_criterion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Criterion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A claimed unit together with everything a strategy needs to mark it.
#[derive(Clone, Debug)]
pub struct UnitContext {
    pub unit: Model,
    pub criterion: question_criterion::Model,
    pub answer: submission_answer::Model,
}

impl Model {
    pub async fn get_by_id<C>(conn: &C, id: i64) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id).one(conn).await
    }

    /// Every unit belonging to a submission, oldest first.
    pub async fn get_by_submission_id<C>(conn: &C, submission_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .inner_join(submission_answer::Entity)
            .filter(submission_answer::Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::Id)
            .all(conn)
            .await
    }

    /// Units of a submission that are still awaiting marking or claimed.
    pub async fn count_unresolved<C>(conn: &C, submission_id: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .inner_join(submission_answer::Entity)
            .filter(submission_answer::Column::SubmissionId.eq(submission_id))
            .filter(
                Column::Status.is_in([GradingUnitStatus::AwaitingMarking, GradingUnitStatus::Claimed]),
            )
            .count(conn)
            .await
    }

    /// Materializes one `AwaitingMarking` unit per (answered question x
    /// criterion) of a submission.
    ///
    /// Leftover units that never reached a terminal state are replaced; terminal
    /// ones are kept and not duplicated. Unanswered questions get no units.
    /// Returns the number of units created.
    pub async fn create_for_submission<C>(
        conn: &C,
        submission_id: i64,
        now: DateTime<Utc>,
    ) -> Result<usize, DbErr>
    where
        C: ConnectionTrait,
    {
        let answers = submission_answer::Model::get_by_submission_id(conn, submission_id).await?;
        let answer_ids: Vec<i64> = answers.iter().map(|a| a.id).collect();
        if answer_ids.is_empty() {
            return Ok(0);
        }

        Entity::delete_many()
            .filter(Column::AnswerId.is_in(answer_ids))
            .filter(
                Column::Status.is_in([GradingUnitStatus::AwaitingMarking, GradingUnitStatus::Claimed]),
            )
            .exec(conn)
            .await?;

        let mut created = 0;
        for answer in answers.iter().filter(|a| a.answered) {
            let kept: HashSet<i64> = Entity::find()
                .filter(Column::AnswerId.eq(answer.id))
                .all(conn)
                .await?
                .into_iter()
                .map(|u| u.criterion_id)
                .collect();

            let criteria =
                question_criterion::Model::get_by_question_id(conn, answer.question_id).await?;
            let fresh: Vec<ActiveModel> = criteria
                .iter()
                .filter(|c| !kept.contains(&c.id))
                .map(|c| ActiveModel {
                    answer_id: Set(answer.id),
                    criterion_id: Set(c.id),
                    status: Set(GradingUnitStatus::AwaitingMarking),
                    claimed_at: Set(None),
                    claimed_by: Set(None),
                    mark: Set(0),
                    result: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .collect();

            if fresh.is_empty() {
                continue;
            }
            created += fresh.len();
            Entity::insert_many(fresh).exec(conn).await?;
        }

        Ok(created)
    }

    /// Claims up to `limit` units for `holder`.
    ///
    /// Eligible units are those awaiting marking and those claimed before
    /// `now - timeout`. Selection and the status update happen in one
    /// transaction inside the marking exclusive section, so a unit is handed
    /// to at most one claimant. Any error leaves the store untouched.
    pub async fn claim_batch(
        db: &DatabaseConnection,
        holder: &str,
        limit: usize,
        timeout: Duration,
        order: ClaimOrder,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self>, DbErr> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let txn = db.begin().await?;
        node_lock::acquire(&txn, node_lock::MARKING_LOCK, holder, now).await?;

        let cutoff = now
            .checked_sub_signed(timeout)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let eligible = Condition::any()
            .add(Column::Status.eq(GradingUnitStatus::AwaitingMarking))
            .add(
                Condition::all()
                    .add(Column::Status.eq(GradingUnitStatus::Claimed))
                    .add(Column::ClaimedAt.lt(cutoff)),
            );

        let query = Entity::find().filter(eligible);
        let query = match order {
            ClaimOrder::OldestFirst => query
                .order_by_asc(Column::CreatedAt)
                .order_by_asc(Column::Id),
            ClaimOrder::NewestFirst => query
                .order_by_desc(Column::CreatedAt)
                .order_by_desc(Column::Id),
        };
        let selected = query.limit(limit as u64).all(&txn).await?;

        if selected.is_empty() {
            txn.commit().await?;
            return Ok(selected);
        }

        let ids: Vec<i64> = selected.iter().map(|u| u.id).collect();
        Entity::update_many()
            .set(ActiveModel {
                status: Set(GradingUnitStatus::Claimed),
                claimed_at: Set(Some(now)),
                claimed_by: Set(Some(holder.to_string())),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(Column::Id.is_in(ids))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(selected
            .into_iter()
            .map(|unit| Self {
                status: GradingUnitStatus::Claimed,
                claimed_at: Some(now),
                claimed_by: Some(holder.to_string()),
                updated_at: now,
                ..unit
            })
            .collect())
    }

    /// Loads a unit with its criterion and answer.
    pub async fn load_context<C>(conn: &C, id: i64) -> Result<UnitContext, PersistError>
    where
        C: ConnectionTrait,
    {
        let Some(unit) = Self::get_by_id(conn, id).await? else {
            return Err(PersistError::UnitNotFound(id));
        };
        let Some(criterion) = question_criterion::Model::get_by_id(conn, unit.criterion_id).await?
        else {
            return Err(PersistError::CriterionNotFound(unit.criterion_id));
        };
        let Some(answer) = submission_answer::Model::get_by_id(conn, unit.answer_id).await? else {
            return Err(PersistError::AnswerNotFound(unit.answer_id));
        };
        Ok(UnitContext {
            unit,
            criterion,
            answer,
        })
    }

    /// Writes a strategy outcome and moves the unit to `Marked`.
    ///
    /// Only applies while the unit is still claimed; returns `false` when it
    /// was resolved elsewhere in the meantime.
    pub async fn complete(
        db: &DatabaseConnection,
        id: i64,
        mark: i32,
        result: Option<Json>,
        now: DateTime<Utc>,
    ) -> Result<bool, PersistError> {
        let mark = check_mark(mark)?;
        let updated = Entity::update_many()
            .set(ActiveModel {
                status: Set(GradingUnitStatus::Marked),
                mark: Set(mark),
                result: Set(result),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(GradingUnitStatus::Claimed))
            .exec(db)
            .await?;
        Ok(updated.rows_affected == 1)
    }

    /// Parks a claimed unit for a human marker. Returns `false` when the unit
    /// was no longer claimed.
    pub async fn mark_for_manual(
        db: &DatabaseConnection,
        id: i64,
        reason: Option<Json>,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let updated = Entity::update_many()
            .set(ActiveModel {
                status: Set(GradingUnitStatus::AwaitingManualMarking),
                result: Set(reason),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(GradingUnitStatus::Claimed))
            .exec(db)
            .await?;
        Ok(updated.rows_affected == 1)
    }

    /// Records a mark given by a human.
    ///
    /// Accepts units awaiting manual marking and already marked units (a
    /// remark). A submission that was already marked goes back to `Submitted`
    /// so the next aggregation picks up the new mark. Returns the updated unit
    /// and its submission id.
    pub async fn record_manual_mark(
        db: &DatabaseConnection,
        id: i64,
        mark: i32,
        result: Option<Json>,
        now: DateTime<Utc>,
    ) -> Result<(Self, i64), PersistError> {
        let mark = check_mark(mark)?;
        let txn = db.begin().await?;
        node_lock::acquire(&txn, node_lock::MARKING_LOCK, "manual", now).await?;

        let Some(unit) = Self::get_by_id(&txn, id).await? else {
            return Err(PersistError::UnitNotFound(id));
        };
        if !unit.status.is_terminal() {
            return Err(PersistError::InvalidState {
                expected: GradingUnitStatus::AwaitingManualMarking.to_string(),
                found: unit.status.to_string(),
            });
        }
        let Some(answer) = submission_answer::Model::get_by_id(&txn, unit.answer_id).await? else {
            return Err(PersistError::AnswerNotFound(unit.answer_id));
        };

        let unit = ActiveModel {
            id: Set(id),
            status: Set(GradingUnitStatus::Marked),
            mark: Set(mark),
            result: Set(result),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        assignment_submission::Entity::update_many()
            .set(assignment_submission::ActiveModel {
                status: Set(SubmissionStatus::Submitted),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(assignment_submission::Column::Id.eq(answer.submission_id))
            .filter(assignment_submission::Column::Status.eq(SubmissionStatus::Marked))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok((unit, answer.submission_id))
    }
}
