use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};

use crate::models::{
    assignment, assignment_question, assignment_submission, question_criterion, submission_answer,
};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Ids of the rows created by [`seed_single_question`].
#[derive(Debug, Clone, Copy)]
pub struct SeededSubmission {
    pub assignment_id: i64,
    pub question_id: i64,
    pub criterion_id: i64,
    pub submission_id: i64,
    pub answer_id: i64,
}

/// One assignment with one question (weight 100) carrying one criterion
/// (weight 100) graded by `strategy_id`, and an active submission answering
/// it with `answer` (`None` leaves the question unanswered).
///
/// The criterion config expects the text `"x"`.
pub async fn seed_single_question(
    db: &DatabaseConnection,
    strategy_id: &str,
    answer: Option<Value>,
) -> SeededSubmission {
    let assignment = assignment::Model::create(db, "Seeded assignment", None)
        .await
        .expect("create assignment");
    let question = assignment_question::Model::create(db, assignment.id, "Q1", 100, 0, 0)
        .await
        .expect("create question");
    let criterion = question_criterion::Model::create(
        db,
        question.id,
        "C1",
        strategy_id,
        100,
        json!({ "text": "x" }),
    )
    .await
    .expect("create criterion");
    let submission = assignment_submission::Model::create(db, assignment.id, 1)
        .await
        .expect("create submission");
    let answer = submission_answer::Model::save(db, submission.id, question.id, answer)
        .await
        .expect("save answer");

    SeededSubmission {
        assignment_id: assignment.id,
        question_id: question.id,
        criterion_id: criterion.id,
        submission_id: submission.id,
        answer_id: answer.id,
    }
}
