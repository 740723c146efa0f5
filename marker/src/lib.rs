//! # Marker Library
//!
//! Pluggable grading strategies for individual criteria.
//!
//! ## Key Concepts
//! - **GradingStrategy**: the capability a grading algorithm exposes, `mark(input) -> outcome`.
//! - **StrategyRegistry**: maps the `strategy_id` stored on a criterion to its strategy.
//! - **CriterionInput / CriterionOutcome**: what a strategy sees and what it returns.
//!
//! Strategies never write to the store. The marking workers persist outcomes
//! and route failures to manual marking.

pub mod error;
pub mod registry;
pub mod strategies;
pub mod traits;
pub mod types;

pub use registry::StrategyRegistry;
pub use traits::strategy::GradingStrategy;
pub use types::{CriterionInput, CriterionOutcome};
