use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, QueryOrder};

use crate::error::PersistError;
use crate::models::assignment_submission::{self, SubmissionStatus};

/// The answer to one question within a submission.
///
/// `answer` is opaque to the marking pipeline; only the grading strategy of
/// each criterion interprets it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submission_answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    /// `false` when the learner left the question blank.
    pub answered: bool,
    pub answer: Option<Json>,
    /// Aggregated question mark on a 0..=100 scale, set by the aggregator.
    pub mark: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment_submission::Entity",
        from = "Column::SubmissionId",
        to = "super::assignment_submission::Column::Id"
    )]
    Submission,
    #[sea_orm(
        belongs_to = "super::assignment_question::Entity",
        from = "Column::QuestionId",
        to = "super::assignment_question::Column::Id"
    )]
    Question,
    #[sea_orm(has_many = "super::grading_unit::Entity")]
    GradingUnits,
}

impl Related<super::assignment_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::assignment_question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::grading_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GradingUnits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Stores (or replaces) the answer to `question_id`. `None` clears it.
    ///
    /// Only allowed while the submission is still active.
    pub async fn save(
        db: &DatabaseConnection,
        submission_id: i64,
        question_id: i64,
        answer: Option<Json>,
    ) -> Result<Self, PersistError> {
        let Some(submission) = assignment_submission::Model::get_by_id(db, submission_id).await?
        else {
            return Err(PersistError::SubmissionNotFound(submission_id));
        };
        if submission.status != SubmissionStatus::Active {
            return Err(PersistError::InvalidState {
                expected: SubmissionStatus::Active.to_string(),
                found: submission.status.to_string(),
            });
        }

        let Some(question) = super::assignment_question::Entity::find_by_id(question_id)
            .one(db)
            .await?
        else {
            return Err(PersistError::QuestionNotFound(question_id));
        };
        if question.assignment_id != submission.assignment_id {
            return Err(PersistError::QuestionMismatch {
                question_id,
                assignment_id: submission.assignment_id,
            });
        }

        let now = Utc::now();
        let existing = Entity::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .filter(Column::QuestionId.eq(question_id))
            .one(db)
            .await?;

        let saved = match existing {
            Some(row) => {
                ActiveModel {
                    id: Set(row.id),
                    answered: Set(answer.is_some()),
                    answer: Set(answer),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(db)
                .await?
            }
            None => {
                ActiveModel {
                    submission_id: Set(submission_id),
                    question_id: Set(question_id),
                    answered: Set(answer.is_some()),
                    answer: Set(answer),
                    mark: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        Ok(saved)
    }

    pub async fn get_by_id<C>(conn: &C, id: i64) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id).one(conn).await
    }

    pub async fn get_by_submission_id<C>(conn: &C, submission_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::Id)
            .all(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{assignment, assignment_question};
    use crate::test_utils::{seed_single_question, setup_test_db};
    use serde_json::json;

    #[tokio::test]
    async fn save_replaces_the_previous_answer() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", Some(json!("first"))).await;

        let saved = Model::save(&db, seeded.submission_id, seeded.question_id, Some(json!("x")))
            .await
            .unwrap();
        assert_eq!(saved.id, seeded.answer_id);
        assert_eq!(saved.answer, Some(json!("x")));
        assert!(saved.answered);

        let cleared = Model::save(&db, seeded.submission_id, seeded.question_id, None)
            .await
            .unwrap();
        assert!(!cleared.answered);
        assert_eq!(
            Model::get_by_submission_id(&db, seeded.submission_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn save_is_refused_after_submission() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", Some(json!("x"))).await;
        assignment_submission::Model::submit(&db, seeded.submission_id, Utc::now())
            .await
            .unwrap();

        let err = Model::save(&db, seeded.submission_id, seeded.question_id, Some(json!("late")))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn save_rejects_questions_of_other_assignments() {
        let db = setup_test_db().await;
        let seeded = seed_single_question(&db, "exact-match", None).await;
        let other = assignment::Model::create(&db, "Other", None).await.unwrap();
        let foreign = assignment_question::Model::create(&db, other.id, "Q", 10, 0, 0)
            .await
            .unwrap();

        let err = Model::save(&db, seeded.submission_id, foreign.id, Some(json!("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::QuestionMismatch { .. }));

        let err = Model::save(&db, 999, seeded.question_id, None).await.unwrap_err();
        assert!(matches!(err, PersistError::SubmissionNotFound(999)));
    }
}
