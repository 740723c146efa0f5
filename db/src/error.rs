use sea_orm::DbErr;
use thiserror::Error;

/// Expected failures of store operations.
///
/// Validation problems (missing parents, out-of-range weights or marks,
/// illegal status transitions) are reported through dedicated variants so
/// callers can react to them without inspecting database error strings.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("assignment {0} not found")]
    AssignmentNotFound(i64),
    #[error("question {0} not found")]
    QuestionNotFound(i64),
    #[error("criterion {0} not found")]
    CriterionNotFound(i64),
    #[error("submission {0} not found")]
    SubmissionNotFound(i64),
    #[error("answer {0} not found")]
    AnswerNotFound(i64),
    #[error("grading unit {0} not found")]
    UnitNotFound(i64),
    #[error("weight must be non-negative, got {0}")]
    InvalidWeight(i32),
    #[error("mark must be within 0..=100, got {0}")]
    InvalidMark(i32),
    #[error("strategy id must not be empty")]
    InvalidStrategy,
    #[error("question {question_id} does not belong to assignment {assignment_id}")]
    QuestionMismatch { question_id: i64, assignment_id: i64 },
    #[error("invalid state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },
    #[error(transparent)]
    Database(#[from] DbErr),
}

pub(crate) fn check_weight(weight: i32) -> Result<i32, PersistError> {
    if weight < 0 {
        Err(PersistError::InvalidWeight(weight))
    } else {
        Ok(weight)
    }
}

pub(crate) fn check_mark(mark: i32) -> Result<i32, PersistError> {
    if (0..=100).contains(&mark) {
        Ok(mark)
    } else {
        Err(PersistError::InvalidMark(mark))
    }
}
