//! Criteria marked by a person. Always defers to manual marking.

use crate::error::MarkerError;
use crate::traits::strategy::{GradingStrategy, MarkFuture};
use crate::types::{CriterionInput, CriterionOutcome};

pub const STRATEGY_ID: &str = "manual";

pub struct ManualStrategy;

impl GradingStrategy for ManualStrategy {
    fn strategy_id(&self) -> &str {
        STRATEGY_ID
    }

    fn mark<'a>(&'a self, _input: &'a CriterionInput) -> MarkFuture<'a> {
        Box::pin(async move { Err::<CriterionOutcome, _>(MarkerError::ManualMarkingRequired) })
    }
}
