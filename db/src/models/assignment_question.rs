use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, IntoActiveModel, QueryOrder};

use crate::error::{PersistError, check_weight};

/// A question definition within an assignment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignment_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub title: String,
    /// Share of the submission mark. Zero is allowed.
    pub weight: i32,
    pub page: i32,
    pub page_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,
    #[sea_orm(has_many = "super::question_criterion::Entity")]
    Criteria,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::question_criterion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Criteria.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        assignment_id: i64,
        title: &str,
        weight: i32,
        page: i32,
        page_order: i32,
    ) -> Result<Self, PersistError> {
        let weight = check_weight(weight)?;
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
            title: Set(title.to_string()),
            weight: Set(weight),
            page: Set(page),
            page_order: Set(page_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(db).await?)
    }

    pub async fn get_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// All questions of an assignment in page order.
    pub async fn get_by_assignment_id<C>(conn: &C, assignment_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::Page)
            .order_by_asc(Column::PageOrder)
            .order_by_asc(Column::Id)
            .all(conn)
            .await
    }

    pub async fn set_weight(
        db: &DatabaseConnection,
        id: i64,
        weight: i32,
    ) -> Result<Self, PersistError> {
        let weight = check_weight(weight)?;
        let Some(question) = Self::get_by_id(db, id).await? else {
            return Err(PersistError::QuestionNotFound(id));
        };

        let mut active = question.into_active_model();
        active.weight = Set(weight);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<(), PersistError> {
        let result = Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(PersistError::QuestionNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn questions_come_back_in_page_order() {
        let db = setup_test_db().await;
        let a = assignment::Model::create(&db, "Ordering", None).await.unwrap();
        let second = Model::create(&db, a.id, "Second", 10, 1, 0).await.unwrap();
        let first = Model::create(&db, a.id, "First", 10, 0, 1).await.unwrap();
        let zeroth = Model::create(&db, a.id, "Zeroth", 10, 0, 0).await.unwrap();

        let ids: Vec<i64> = Model::get_by_assignment_id(&db, a.id)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![zeroth.id, first.id, second.id]);
    }

    #[tokio::test]
    async fn create_validates_weight_and_parent() {
        let db = setup_test_db().await;
        let a = assignment::Model::create(&db, "Validation", None).await.unwrap();

        let err = Model::create(&db, a.id, "Q", -1, 0, 0).await.unwrap_err();
        assert!(matches!(err, PersistError::InvalidWeight(-1)));

        let err = Model::create(&db, 999, "Q", 10, 0, 0).await.unwrap_err();
        assert!(matches!(err, PersistError::AssignmentNotFound(999)));

        let q = Model::create(&db, a.id, "Q", 0, 0, 0).await.unwrap();
        let err = Model::set_weight(&db, q.id, -5).await.unwrap_err();
        assert!(matches!(err, PersistError::InvalidWeight(-5)));
        assert_eq!(Model::set_weight(&db, q.id, 40).await.unwrap().weight, 40);
    }
}
