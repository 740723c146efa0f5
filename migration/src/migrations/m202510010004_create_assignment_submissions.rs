use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010004_create_assignment_submissions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("assignment_submissions"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("assignment_id"))
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("user_id")).integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("submission_status_enum"),
                                vec![
                                    Alias::new("active"),
                                    Alias::new("submitted"),
                                    Alias::new("marking"),
                                    Alias::new("marked"),
                                ],
                            )
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Alias::new("mark")).double().null())
                    .col(ColumnDef::new(Alias::new("time_start")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("time_end")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                Alias::new("assignment_submissions"),
                                Alias::new("assignment_id"),
                            )
                            .to(Alias::new("assignments"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignment_submissions_assignment_status")
                    .table(Alias::new("assignment_submissions"))
                    .col(Alias::new("assignment_id"))
                    .col(Alias::new("status"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("assignment_submissions"))
                    .to_owned(),
            )
            .await
    }
}
