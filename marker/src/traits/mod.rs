//!
//! Traits Module
//!
//! - [`strategy`]: the [`strategy::GradingStrategy`] capability implemented by every grading algorithm.

pub mod strategy;
