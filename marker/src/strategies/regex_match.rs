//! A strategy that marks an answer by testing it against a regular expression.
//!
//! The `RegexMatchStrategy` awards full marks when the configured pattern
//! matches anywhere in the answer text (or, with `invert`, when it does not).
//!
//! Criterion config:
//!
//! ```json
//! {
//!   "pattern": "^\\d+$",
//!   "case_insensitive": false,
//!   "multi_line": false,
//!   "dot_all": false,
//!   "invert": false,
//!   "hide_pattern": false
//! }
//! ```
//!
//! Every flag defaults to `false`. With `hide_pattern` the pattern is left out
//! of the result payload shown to learners.

use crate::error::MarkerError;
use crate::traits::strategy::{GradingStrategy, MarkFuture};
use crate::types::{CriterionInput, CriterionOutcome};
use regex::RegexBuilder;
use serde_json::{Value, json};

pub const STRATEGY_ID: &str = "regex-match";

/// Regular-expression criterion.
///
/// An invalid pattern is a configuration problem a person has to look at, so
/// it is reported as [`MarkerError::InvalidPattern`] rather than scored 0.
pub struct RegexMatchStrategy;

fn flag(config: &Value, name: &str) -> bool {
    config[name].as_bool().unwrap_or(false)
}

impl RegexMatchStrategy {
    fn evaluate(input: &CriterionInput) -> Result<CriterionOutcome, MarkerError> {
        let config = &input.config;
        let pattern = config["pattern"]
            .as_str()
            .ok_or_else(|| MarkerError::InvalidConfig("missing string field 'pattern'".into()))?;

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flag(config, "case_insensitive"))
            .multi_line(flag(config, "multi_line"))
            .dot_matches_new_line(flag(config, "dot_all"))
            .build()
            .map_err(|e| MarkerError::InvalidPattern(e.to_string()))?;

        if !input.answered {
            return Ok(CriterionOutcome::unanswered());
        }
        let text = input
            .answer_text()
            .ok_or_else(|| MarkerError::InvalidAnswer("expected a text answer".into()))?;

        let found = regex.is_match(text);
        let passed = found != flag(config, "invert");

        let mut result = json!({ "matched": found });
        if !flag(config, "hide_pattern") {
            result["pattern"] = json!(pattern);
        }
        Ok(CriterionOutcome::pass_fail(passed, result))
    }
}

impl GradingStrategy for RegexMatchStrategy {
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

    fn input(config: Value, answer: &str) -> CriterionInput {
        CriterionInput {
            unit_id: 1,
            criterion_id: 1,
            strategy_id: STRATEGY_ID.into(),
            config,
            answered: true,
            answer: Some(json!(answer)),
        }
    }

    #[tokio::test]
    async fn test_pattern_match_awards_full_marks() {
        let outcome = RegexMatchStrategy
            .mark(&input(json!({ "pattern": r"number: \d+" }), "number: 42"))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 100);
        assert_eq!(outcome.result["pattern"], json!(r"number: \d+"));
    }

    #[tokio::test]
    async fn test_flags_are_applied() {
        let config = json!({ "pattern": "^hello.world$", "case_insensitive": true, "dot_all": true });
        let outcome = RegexMatchStrategy
            .mark(&input(config, "HELLO\nWORLD"))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 100);

        let multi = json!({ "pattern": "^two$", "multi_line": true });
        let outcome = RegexMatchStrategy
            .mark(&input(multi, "one\ntwo\nthree"))
            .await
            .unwrap();
        assert_eq!(outcome.mark, 100);
    }

    #[tokio::test]
    async fn test_invert_rewards_absence() {
        let config = json!({ "pattern": "TODO", "invert": true, "hide_pattern": true });
        let clean = RegexMatchStrategy
            .mark(&input(config.clone(), "done"))
            .await
            .unwrap();
        assert_eq!(clean.mark, 100);
        assert!(clean.result.get("pattern").is_none());

        let dirty = RegexMatchStrategy
            .mark(&input(config, "TODO: finish"))
            .await
            .unwrap();
        assert_eq!(dirty.mark, 0);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_an_error() {
        let err = RegexMatchStrategy
            .mark(&input(json!({ "pattern": "(unclosed" }), "anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkerError::InvalidPattern(_)));
    }
}
