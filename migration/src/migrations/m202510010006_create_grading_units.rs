use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010006_create_grading_units"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("grading_units"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("answer_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("criterion_id")).integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("grading_unit_status_enum"),
                                vec![
                                    Alias::new("awaiting_marking"),
                                    Alias::new("claimed"),
                                    Alias::new("marked"),
                                    Alias::new("awaiting_manual_marking"),
                                ],
                            )
                            .not_null()
                            .default("awaiting_marking"),
                    )
                    .col(ColumnDef::new(Alias::new("claimed_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("claimed_by")).string().null())
                    .col(ColumnDef::new(Alias::new("mark")).integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("result")).json().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("grading_units"), Alias::new("answer_id"))
                            .to(Alias::new("submission_answers"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("grading_units"), Alias::new("criterion_id"))
                            .to(Alias::new("question_criteria"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .col(Alias::new("answer_id"))
                            .col(Alias::new("criterion_id"))
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Claim scans filter on status and walk created_at.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_grading_units_status_created_at")
                    .table(Alias::new("grading_units"))
                    .col(Alias::new("status"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("grading_units")).to_owned())
            .await
    }
}
