//! # Types Module
//!
//! Data handed to a grading strategy and the outcome it returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything a strategy sees of one grading unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionInput {
    /// Grading unit being marked.
    pub unit_id: i64,
    /// Criterion definition the unit was created from.
    pub criterion_id: i64,
    /// Strategy the criterion selects.
    pub strategy_id: String,
    /// Criterion configuration, interpreted only by the strategy.
    pub config: Value,
    /// `false` when the learner left the question blank.
    pub answered: bool,
    /// Learner answer, interpreted only by the strategy.
    pub answer: Option<Value>,
}

impl CriterionInput {
    /// The answer as text, if it is a JSON string.
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_ref().and_then(Value::as_str)
    }
}

/// Result of marking one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    /// Mark on the criterion-local 0..=100 scale.
    pub mark: i32,
    /// Payload stored with the grading unit for display.
    pub result: Value,
}

impl CriterionOutcome {
    pub fn new(mark: i32, result: Value) -> Self {
        Self {
            mark: mark.clamp(0, 100),
            result,
        }
    }

    /// Full marks when `passed`, none otherwise.
    pub fn pass_fail(passed: bool, result: Value) -> Self {
        Self::new(if passed { 100 } else { 0 }, result)
    }

    /// Outcome for a question the learner did not answer.
    pub fn unanswered() -> Self {
        Self::new(0, serde_json::json!({ "answered": false }))
    }
}
