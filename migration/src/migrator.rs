use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510010001_create_assignments::Migration),
            Box::new(migrations::m202510010002_create_assignment_questions::Migration),
            Box::new(migrations::m202510010003_create_question_criteria::Migration),
            Box::new(migrations::m202510010004_create_assignment_submissions::Migration),
            Box::new(migrations::m202510010005_create_submission_answers::Migration),
            Box::new(migrations::m202510010006_create_grading_units::Migration),
            Box::new(migrations::m202510010007_create_node_locks::Migration),
        ]
    }
}
