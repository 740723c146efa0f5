use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010005_create_submission_answers"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("submission_answers"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("submission_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("question_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("answered")).boolean().not_null().default(false))
                    .col(ColumnDef::new(Alias::new("answer")).json().null())
                    .col(ColumnDef::new(Alias::new("mark")).double().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("submission_answers"), Alias::new("submission_id"))
                            .to(Alias::new("assignment_submissions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("submission_answers"), Alias::new("question_id"))
                            .to(Alias::new("assignment_questions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .col(Alias::new("submission_id"))
                            .col(Alias::new("question_id"))
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("submission_answers")).to_owned())
            .await
    }
}
