use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};

/// Name of the lock row guarding claim, due-date and completion checks.
pub const MARKING_LOCK: &str = "marking";

/// A named, store-wide advisory lock.
///
/// Holding the lock means having written its row inside the current
/// transaction. SQLite grants the database write lock to the first writing
/// statement of a transaction and keeps it until commit or rollback, so every
/// other transaction that starts with the same write waits behind it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "node_locks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Node that last entered the section. Diagnostics only.
    pub holder: Option<String>,
    pub acquired_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Enters the exclusive section named `name` on `conn`.
///
/// Must be the first statement executed in a transaction. Waits (up to the
/// driver's busy timeout) while another transaction holds the section and
/// returns the driver error if the wait times out.
pub async fn acquire<C>(conn: &C, name: &str, holder: &str, now: DateTime<Utc>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let updated = Entity::update_many()
        .set(ActiveModel {
            holder: Set(Some(holder.to_string())),
            acquired_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(Column::Name.eq(name))
        .exec(conn)
        .await?;

    if updated.rows_affected == 0 {
        ActiveModel {
            name: Set(name.to_string()),
            holder: Set(Some(holder.to_string())),
            acquired_at: Set(Some(now)),
        }
        .insert(conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use sea_orm::TransactionTrait;

    #[tokio::test]
    async fn acquire_records_holder_and_creates_missing_rows() {
        let db = setup_test_db().await;
        let now = Utc::now();

        let txn = db.begin().await.unwrap();
        acquire(&txn, MARKING_LOCK, "node-a", now).await.unwrap();
        acquire(&txn, "reports", "node-a", now).await.unwrap();
        txn.commit().await.unwrap();

        let marking = Entity::find_by_id(MARKING_LOCK.to_string())
            .one(&db)
            .await
            .unwrap()
            .expect("seeded lock row");
        assert_eq!(marking.holder.as_deref(), Some("node-a"));

        let reports = Entity::find_by_id("reports".to_string()).one(&db).await.unwrap();
        assert!(reports.is_some(), "missing lock rows are created on first use");
    }
}
