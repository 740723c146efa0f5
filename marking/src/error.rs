use db::error::PersistError;
use db::grade::GradeComputationError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failure of one poller cycle or one grading unit.
///
/// Never fatal: the poller and the workers log it and carry on.
#[derive(Debug, Error)]
pub enum MarkingError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("aggregation failed: {0}")]
    Aggregation(#[from] GradeComputationError),
}
