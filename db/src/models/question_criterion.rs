use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, IntoActiveModel, QueryOrder};

use crate::error::{PersistError, check_weight};

/// A grading criterion attached to a question.
///
/// `strategy_id` selects the grading strategy that marks the criterion and
/// `config` is handed to that strategy untouched.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "question_criteria")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub question_id: i64,
    pub title: String,
    pub strategy_id: String,
    /// Share of the question mark. Zero is allowed.
    pub weight: i32,
    pub config: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment_question::Entity",
        from = "Column::QuestionId",
        to = "super::assignment_question::Column::Id"
    )]
    Question,
}

impl Related<super::assignment_question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        question_id: i64,
        title: &str,
        strategy_id: &str,
        weight: i32,
        config: Json,
    ) -> Result<Self, PersistError> {
        let weight = check_weight(weight)?;
        if strategy_id.trim().is_empty() {
            return Err(PersistError::InvalidStrategy);
        }
        if super::assignment_question::Entity::find_by_id(question_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(PersistError::QuestionNotFound(question_id));
        }

        let now = Utc::now();
        let active = ActiveModel {
            question_id: Set(question_id),
            title: Set(title.to_string()),
            strategy_id: Set(strategy_id.to_string()),
            weight: Set(weight),
            config: Set(config),
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

    pub async fn get_by_question_id<C>(conn: &C, question_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::QuestionId.eq(question_id))
            .order_by_asc(Column::Id)
            .all(conn)
            .await
    }

    pub async fn edit(
        db: &DatabaseConnection,
        id: i64,
        weight: Option<i32>,
        config: Option<Json>,
    ) -> Result<Self, PersistError> {
        let Some(criterion) = Self::get_by_id(db, id).await? else {
            return Err(PersistError::CriterionNotFound(id));
        };

        let mut active = criterion.into_active_model();
        if let Some(w) = weight {
            active.weight = Set(check_weight(w)?);
        }
        if let Some(c) = config {
            active.config = Set(c);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<(), PersistError> {
        let result = Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(PersistError::CriterionNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{assignment, assignment_question};
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn create_rejects_blank_strategy_and_bad_weight() {
        let db = setup_test_db().await;
        let a = assignment::Model::create(&db, "Criteria", None).await.unwrap();
        let q = assignment_question::Model::create(&db, a.id, "Q", 10, 0, 0)
            .await
            .unwrap();

        let err = Model::create(&db, q.id, "C", "  ", 10, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::InvalidStrategy));

        let err = Model::create(&db, q.id, "C", "exact-match", -3, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::InvalidWeight(-3)));

        let err = Model::create(&db, 77, "C", "exact-match", 10, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::QuestionNotFound(77)));
    }

    #[tokio::test]
    async fn edit_keeps_fields_that_are_not_given() {
        let db = setup_test_db().await;
        let a = assignment::Model::create(&db, "Criteria", None).await.unwrap();
        let q = assignment_question::Model::create(&db, a.id, "Q", 10, 0, 0)
            .await
            .unwrap();
        let c = Model::create(&db, q.id, "C", "regex-match", 10, json!({ "pattern": "a+" }))
            .await
            .unwrap();

        let edited = Model::edit(&db, c.id, Some(30), None).await.unwrap();
        assert_eq!(edited.weight, 30);
        assert_eq!(edited.config, json!({ "pattern": "a+" }));

        let err = Model::edit(&db, 1234, None, None).await.unwrap_err();
        assert!(matches!(err, PersistError::CriterionNotFound(1234)));

        assert_eq!(Model::get_by_question_id(&db, q.id).await.unwrap().len(), 1);
        Model::delete(&db, c.id).await.unwrap();
        assert!(Model::get_by_question_id(&db, q.id).await.unwrap().is_empty());
    }
}
