use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010007_create_node_locks"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("node_locks"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("name")).string().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("holder")).string().null())
                    .col(ColumnDef::new(Alias::new("acquired_at")).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Alias::new("node_locks"))
                    .columns([Alias::new("name")])
                    .values_panic(["marking".into()])
                    .on_conflict(OnConflict::column(Alias::new("name")).do_nothing().to_owned())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("node_locks")).to_owned())
            .await
    }
}
