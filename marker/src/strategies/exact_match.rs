//! Awards full marks when the answer text equals the expected text.
//!
//! Criterion config:
//!
//! ```json
//! { "text": "Paris", "case_sensitive": false }
//! ```
//!
//! Surrounding whitespace is ignored on both sides. `case_sensitive` defaults
//! to `true`.

use crate::error::MarkerError;
use crate::traits::strategy::{GradingStrategy, MarkFuture};
use crate::types::{CriterionInput, CriterionOutcome};
use serde_json::json;

pub const STRATEGY_ID: &str = "exact-match";

/// Compares the whole answer against one expected string.
pub struct ExactMatchStrategy;

impl ExactMatchStrategy {
    fn evaluate(input: &CriterionInput) -> Result<CriterionOutcome, MarkerError> {
        let expected = input.config["text"]
            .as_str()
            .ok_or_else(|| MarkerError::InvalidConfig("missing string field 'text'".into()))?;
        let case_sensitive = input.config["case_sensitive"].as_bool().unwrap_or(true);

        if !input.answered {
            return Ok(CriterionOutcome::unanswered());
        }
        let given = input
            .answer_text()
            .ok_or_else(|| MarkerError::InvalidAnswer("expected a text answer".into()))?;

        let (given, expected) = (given.trim(), expected.trim());
        let matched = if case_sensitive {
            given == expected
        } else {
            given.to_lowercase() == expected.to_lowercase()
        };

        Ok(CriterionOutcome::pass_fail(matched, json!({ "matched": matched })))
    }
}

impl GradingStrategy for ExactMatchStrategy {
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
    use serde_json::Value;

    fn input(config: Value, answer: Option<Value>) -> CriterionInput {
        CriterionInput {
            unit_id: 1,
            criterion_id: 1,
            strategy_id: STRATEGY_ID.into(),
            config,
            answered: answer.is_some(),
            answer,
        }
    }

    #[tokio::test]
    async fn test_exact_answer_gets_full_marks() {
        let outcome = ExactMatchStrategy
            .mark(&input(json!({ "text": "Paris" }), Some(json!(" Paris "))))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 100);
        assert_eq!(outcome.result, json!({ "matched": true }));
    }

    #[tokio::test]
    async fn test_case_sensitivity_flag() {
        let strict = ExactMatchStrategy
            .mark(&input(json!({ "text": "Paris" }), Some(json!("paris"))))
            .await
            .unwrap();
        assert_eq!(strict.mark, 0);

        let relaxed = ExactMatchStrategy
            .mark(&input(
                json!({ "text": "Paris", "case_sensitive": false }),
                Some(json!("PARIS")),
            ))
            .await
            .unwrap();
        assert_eq!(relaxed.mark, 100);
    }

    #[tokio::test]
    async fn test_unanswered_scores_zero() {
        let outcome = ExactMatchStrategy
            .mark(&input(json!({ "text": "Paris" }), None))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 0);
    }

    #[tokio::test]
    async fn test_missing_text_is_a_config_error() {
        let err = ExactMatchStrategy
            .mark(&input(json!({}), Some(json!("Paris"))))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkerError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_non_text_answer_is_rejected() {
        let err = ExactMatchStrategy
            .mark(&input(json!({ "text": "4" }), Some(json!(4))))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkerError::InvalidAnswer(_)));
    }
}
