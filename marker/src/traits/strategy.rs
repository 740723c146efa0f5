//!
//! # Grading Strategy Trait
//!
//! This module defines the [`GradingStrategy`] trait, the capability every
//! pluggable grading algorithm exposes to the marking pipeline.
//!
//! A strategy receives a [`CriterionInput`] and returns either a
//! [`CriterionOutcome`] (mark plus display payload) or a [`MarkerError`]. It
//! never touches the store: the worker that dispatched it persists the outcome.
//!

use crate::error::MarkerError;
use crate::types::{CriterionInput, CriterionOutcome};
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`GradingStrategy::mark`].
pub type MarkFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CriterionOutcome, MarkerError>> + Send + 'a>>;

/// A pluggable grading algorithm, looked up by [`GradingStrategy::strategy_id`].
///
/// Implementations may be arbitrarily slow (compiling code, calling services);
/// the pipeline never holds a store lock while awaiting them.
///
/// # Returns
/// - `Ok(CriterionOutcome)`: the criterion was marked automatically.
/// - `Err(MarkerError)`: automatic marking is impossible; the unit goes to a human.
pub trait GradingStrategy: Send + Sync {
    /// Identifier criteria use to select this strategy.
    fn strategy_id(&self) -> &str;

    fn mark<'a>(&'a self, input: &'a CriterionInput) -> MarkFuture<'a>;
}
