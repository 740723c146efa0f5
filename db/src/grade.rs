use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};

use crate::models::{
    assignment_question,
    assignment_submission::{self, SubmissionStatus},
    grading_unit::{self, GradingUnitStatus},
    node_lock, question_criterion, submission_answer,
};

#[derive(Debug)]
pub enum GradeComputationError {
    SubmissionNotFound(i64),
    /// The submission left `Marking` before the mark could be stored.
    NotMarking(SubmissionStatus),
    Database(sea_orm::DbErr),
}

impl From<sea_orm::DbErr> for GradeComputationError {
    fn from(value: sea_orm::DbErr) -> Self {
        GradeComputationError::Database(value)
    }
}

impl std::fmt::Display for GradeComputationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeComputationError::SubmissionNotFound(id) => {
                write!(f, "Submission {id} not found")
            }
            GradeComputationError::NotMarking(status) => {
                write!(f, "Submission is {status}, expected marking")
            }
            GradeComputationError::Database(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for GradeComputationError {}

/// Weighted mean of `(mark, weight)` pairs on the marks' own scale.
///
/// Returns 0 when the weights sum to zero.
pub fn weighted_mark(parts: &[(f64, f64)]) -> f64 {
    let total: f64 = parts.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return 0.0;
    }
    parts.iter().map(|(m, w)| m * w).sum::<f64>() / total
}

/// Computes and stores the final mark of a submission in `Marking`.
///
/// Question mark: criterion marks weighted by criterion weight, over every
/// criterion of the question. Units awaiting manual marking and criteria
/// without a unit count as 0.
///
/// Submission mark: question marks weighted by question weight, over every
/// question of the assignment. Unanswered questions score 0.
///
/// Question marks, the submission mark and the `Marked` status are written in
/// one transaction inside the marking exclusive section.
pub async fn compute_submission_mark(
    db: &DatabaseConnection,
    submission_id: i64,
) -> Result<f64, GradeComputationError> {
    let now = Utc::now();
    let txn = db.begin().await?;
    node_lock::acquire(&txn, node_lock::MARKING_LOCK, "aggregate", now).await?;

    let Some(submission) = assignment_submission::Model::get_by_id(&txn, submission_id).await?
    else {
        return Err(GradeComputationError::SubmissionNotFound(submission_id));
    };
    if submission.status != SubmissionStatus::Marking {
        return Err(GradeComputationError::NotMarking(submission.status));
    }

    let questions =
        assignment_question::Model::get_by_assignment_id(&txn, submission.assignment_id).await?;
    let answers: HashMap<i64, submission_answer::Model> =
        submission_answer::Model::get_by_submission_id(&txn, submission_id)
            .await?
            .into_iter()
            .map(|a| (a.question_id, a))
            .collect();
    let units = grading_unit::Model::get_by_submission_id(&txn, submission_id).await?;

    let mut question_parts = Vec::with_capacity(questions.len());
    for question in &questions {
        let criteria = question_criterion::Model::get_by_question_id(&txn, question.id).await?;

        let question_mark = match answers.get(&question.id) {
            Some(answer) if answer.answered => {
                let marks: HashMap<i64, f64> = units
                    .iter()
                    .filter(|u| u.answer_id == answer.id && u.status == GradingUnitStatus::Marked)
                    .map(|u| (u.criterion_id, f64::from(u.mark)))
                    .collect();
                let parts: Vec<(f64, f64)> = criteria
                    .iter()
                    .map(|c| {
                        (
                            marks.get(&c.id).copied().unwrap_or(0.0),
                            f64::from(c.weight),
                        )
                    })
                    .collect();
                weighted_mark(&parts)
            }
            _ => 0.0,
        };

        if let Some(answer) = answers.get(&question.id) {
            submission_answer::ActiveModel {
                id: Set(answer.id),
                mark: Set(Some(question_mark)),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }
        question_parts.push((question_mark, f64::from(question.weight)));
    }

    let mark = weighted_mark(&question_parts);

    let stored = assignment_submission::Entity::update_many()
        .set(assignment_submission::ActiveModel {
            status: Set(SubmissionStatus::Marked),
            mark: Set(Some(mark)),
            updated_at: Set(now),
            ..Default::default()
        })
        .filter(assignment_submission::Column::Id.eq(submission_id))
        .filter(assignment_submission::Column::Status.eq(SubmissionStatus::Marking))
        .exec(&txn)
        .await?;
    if stored.rows_affected != 1 {
        return Err(GradeComputationError::NotMarking(submission.status));
    }

    txn.commit().await?;
    Ok(mark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{assignment, grading_unit::ActiveModel as UnitActive};
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    #[test]
    fn weighted_mark_guards_zero_weights() {
        assert_eq!(weighted_mark(&[]), 0.0);
        assert_eq!(weighted_mark(&[(100.0, 0.0), (50.0, 0.0)]), 0.0);
        assert_eq!(weighted_mark(&[(100.0, 50.0), (100.0, 50.0)]), 100.0);
        assert_eq!(weighted_mark(&[(0.0, 50.0), (100.0, 50.0)]), 50.0);
        assert_eq!(weighted_mark(&[(100.0, 1.0), (40.0, 3.0)]), 55.0);
    }

    struct Fixture {
        submission_id: i64,
        answer_ids: Vec<i64>,
        criterion_ids: Vec<Vec<i64>>,
    }

    /// Builds a submission with one question per entry of `layout`; each entry
    /// is `(question weight, [criterion weights])`. Every question is answered.
    async fn fixture(db: &DatabaseConnection, layout: &[(i32, &[i32])]) -> Fixture {
        let a = assignment::Model::create(db, "Weights", None).await.unwrap();
        let s = assignment_submission::Model::create(db, a.id, 7).await.unwrap();

        let mut answer_ids = Vec::new();
        let mut criterion_ids = Vec::new();
        for (i, (qw, cws)) in layout.iter().enumerate() {
            let q = assignment_question::Model::create(db, a.id, "Q", *qw, 0, i as i32)
                .await
                .unwrap();
            let mut ids = Vec::new();
            for cw in cws.iter() {
                let c = question_criterion::Model::create(db, q.id, "C", "exact-match", *cw, json!({}))
                    .await
                    .unwrap();
                ids.push(c.id);
            }
            let ans = submission_answer::Model::save(db, s.id, q.id, Some(json!("answer")))
                .await
                .unwrap();
            answer_ids.push(ans.id);
            criterion_ids.push(ids);
        }

        grading_unit::Model::create_for_submission(db, s.id, Utc::now())
            .await
            .unwrap();

        Fixture {
            submission_id: s.id,
            answer_ids,
            criterion_ids,
        }
    }

    async fn resolve(db: &DatabaseConnection, f: &Fixture, marks: &[&[i32]]) {
        let units = grading_unit::Model::get_by_submission_id(db, f.submission_id)
            .await
            .unwrap();
        for (qi, qmarks) in marks.iter().enumerate() {
            for (ci, mark) in qmarks.iter().enumerate() {
                let unit = units
                    .iter()
                    .find(|u| u.answer_id == f.answer_ids[qi] && u.criterion_id == f.criterion_ids[qi][ci])
                    .expect("unit exists");
                UnitActive {
                    id: Set(unit.id),
                    status: Set(GradingUnitStatus::Marked),
                    mark: Set(*mark),
                    ..Default::default()
                }
                .update(db)
                .await
                .unwrap();
            }
        }
        assignment_submission::ActiveModel {
            id: Set(f.submission_id),
            status: Set(SubmissionStatus::Marking),
            ..Default::default()
        }
        .update(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn all_correct_scores_full_marks() {
        let db = setup_test_db().await;
        let f = fixture(&db, &[(50, &[100]), (50, &[100])]).await;
        resolve(&db, &f, &[&[100], &[100]]).await;

        let mark = compute_submission_mark(&db, f.submission_id).await.unwrap();
        assert_eq!(mark, 100.0);

        let stored = assignment_submission::Model::get_by_id(&db, f.submission_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Marked);
        assert_eq!(stored.mark, Some(100.0));
    }

    #[tokio::test]
    async fn one_wrong_one_right_scores_half() {
        let db = setup_test_db().await;
        let f = fixture(&db, &[(50, &[100]), (50, &[100])]).await;
        resolve(&db, &f, &[&[0], &[100]]).await;

        let mark = compute_submission_mark(&db, f.submission_id).await.unwrap();
        assert_eq!(mark, 50.0);

        let answers = submission_answer::Model::get_by_submission_id(&db, f.submission_id)
            .await
            .unwrap();
        let question_marks: Vec<Option<f64>> = answers.iter().map(|a| a.mark).collect();
        assert_eq!(question_marks, vec![Some(0.0), Some(100.0)]);
    }

    #[tokio::test]
    async fn zero_criterion_weight_contributes_zero() {
        let db = setup_test_db().await;
        let f = fixture(&db, &[(50, &[0]), (50, &[100])]).await;
        resolve(&db, &f, &[&[100], &[100]]).await;

        let mark = compute_submission_mark(&db, f.submission_id).await.unwrap();
        assert!(mark.is_finite());
        assert_eq!(mark, 50.0);
    }

    #[tokio::test]
    async fn criterion_weights_split_a_question() {
        let db = setup_test_db().await;
        let f = fixture(&db, &[(100, &[25, 75])]).await;
        resolve(&db, &f, &[&[100, 0]]).await;

        let mark = compute_submission_mark(&db, f.submission_id).await.unwrap();
        assert_eq!(mark, 25.0);
    }

    #[tokio::test]
    async fn refuses_submissions_not_in_marking() {
        let db = setup_test_db().await;
        let f = fixture(&db, &[(100, &[100])]).await;

        let err = compute_submission_mark(&db, f.submission_id).await.unwrap_err();
        assert!(matches!(
            err,
            GradeComputationError::NotMarking(SubmissionStatus::Active)
        ));
    }
}
