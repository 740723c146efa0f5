//! Multiple-choice criterion: the selected options must equal the correct ones.
//!
//! Config `{ "correct": [1, 3] }`; the answer is either a single option index
//! or an array of indexes. Order and duplicates do not matter.

use std::collections::BTreeSet;

use crate::error::MarkerError;
use crate::traits::strategy::{GradingStrategy, MarkFuture};
use crate::types::{CriterionInput, CriterionOutcome};
use serde_json::{Value, json};

pub const STRATEGY_ID: &str = "multiple-choice";

pub struct MultipleChoiceStrategy;

fn indexes(value: &Value) -> Option<BTreeSet<u64>> {
    match value {
        Value::Number(n) => n.as_u64().map(|i| BTreeSet::from([i])),
        Value::Array(items) => items.iter().map(Value::as_u64).collect(),
        _ => None,
    }
}

impl MultipleChoiceStrategy {
    fn evaluate(input: &CriterionInput) -> Result<CriterionOutcome, MarkerError> {
        let correct = indexes(&input.config["correct"]).ok_or_else(|| {
            MarkerError::InvalidConfig("'correct' must be an index or a list of indexes".into())
        })?;

        if !input.answered {
            return Ok(CriterionOutcome::unanswered());
        }
        let selected = input
            .answer
            .as_ref()
            .and_then(indexes)
            .ok_or_else(|| MarkerError::InvalidAnswer("expected option indexes".into()))?;

        let passed = selected == correct;
        Ok(CriterionOutcome::pass_fail(
            passed,
            json!({ "selected": selected, "correct": passed }),
        ))
    }
}

impl GradingStrategy for MultipleChoiceStrategy {
    fn strategy_id(&self) -> &str {
        STRATEGY_ID
    }

    fn mark<'a>(&'a self, input: &'a CriterionInput) -> MarkFuture<'a> {
        Box::pin(async move { Self::evaluate(input) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(correct: Value, answer: Value) -> CriterionInput {
        CriterionInput {
            unit_id: 1,
            criterion_id: 1,
            strategy_id: STRATEGY_ID.into(),
            config: json!({ "correct": correct }),
            answered: true,
            answer: Some(answer),
        }
    }

    #[tokio::test]
    async fn test_same_selection_in_any_order_passes() {
        let outcome = MultipleChoiceStrategy
            .mark(&input(json!([1, 3]), json!([3, 1])))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 100);
    }

    #[tokio::test]
    async fn test_partial_selection_fails() {
        let outcome = MultipleChoiceStrategy
            .mark(&input(json!([1, 3]), json!([1])))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 0);
    }

    #[tokio::test]
    async fn test_single_index_answer() {
        let outcome = MultipleChoiceStrategy
            .mark(&input(json!(2), json!(2)))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 100);
    }

    #[tokio::test]
    async fn test_text_answer_is_rejected() {
        let err = MultipleChoiceStrategy
            .mark(&input(json!([0]), json!("a")))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkerError::InvalidAnswer(_)));
    }
}
