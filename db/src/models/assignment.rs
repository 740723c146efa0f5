use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, IntoActiveModel, QueryOrder};

use crate::error::PersistError;

/// An assessment learners attempt. Its due date drives automatic submission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    /// Primary key of the assignment.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Deadline after which active submissions are submitted automatically.
    pub due_date: Option<DateTime<Utc>>,
    /// Set once the due-date sweep has processed this assignment.
    pub due_handled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::assignment_question::Entity")]
    Questions,
    #[sea_orm(has_many = "super::assignment_submission::Entity")]
    Submissions,
}

impl Related<super::assignment_question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::assignment_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, PersistError> {
        let now = Utc::now();
        let active = ActiveModel {
            title: Set(title.to_string()),
            due_date: Set(due_date),
            due_handled: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(db).await?)
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Moves the deadline. The assignment becomes eligible for the sweep again.
    pub async fn set_due_date(
        db: &DatabaseConnection,
        id: i64,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, PersistError> {
        let Some(assignment) = Self::get_by_id(db, id).await? else {
            return Err(PersistError::AssignmentNotFound(id));
        };

        let mut active = assignment.into_active_model();
        active.due_date = Set(due_date);
        active.due_handled = Set(false);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<(), PersistError> {
        let result = Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(PersistError::AssignmentNotFound(id));
        }
        Ok(())
    }

    /// Assignments whose deadline lies before `now` and which the sweep has
    /// not processed yet, earliest deadline first.
    pub async fn find_past_due<C>(conn: &C, now: DateTime<Utc>) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::DueHandled.eq(false))
            .filter(Column::DueDate.is_not_null())
            .filter(Column::DueDate.lt(now))
            .order_by_asc(Column::DueDate)
            .all(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn moving_the_due_date_rearms_the_sweep() {
        let db = setup_test_db().await;
        let now = Utc::now();
        let a = Model::create(&db, "Prac 1", Some(now - Duration::hours(1)))
            .await
            .unwrap();

        let due = Model::find_past_due(&db, now).await.unwrap();
        assert_eq!(due.len(), 1);

        ActiveModel {
            id: Set(a.id),
            due_handled: Set(true),
            ..Default::default()
        }
        .update(&db)
        .await
        .unwrap();
        assert!(Model::find_past_due(&db, now).await.unwrap().is_empty());

        let moved = Model::set_due_date(&db, a.id, Some(now - Duration::minutes(5)))
            .await
            .unwrap();
        assert!(!moved.due_handled);
        assert_eq!(Model::find_past_due(&db, now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_assignment_is_reported() {
        let db = setup_test_db().await;

        let err = Model::set_due_date(&db, 404, None).await.unwrap_err();
        assert!(matches!(err, PersistError::AssignmentNotFound(404)));

        let err = Model::delete(&db, 404).await.unwrap_err();
        assert!(matches!(err, PersistError::AssignmentNotFound(404)));
    }
}
