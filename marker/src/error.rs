//! Marker Error Types
//!
//! This module defines the [`MarkerError`] enum, which covers every way a
//! grading strategy can fail to produce a mark for a criterion.
//!
//! A failed strategy is not retried: the marking pipeline hands the grading
//! unit to a human instead. The message is stored with the unit so the human
//! marker can see why automatic marking gave up.
//!
//! # Example
//!
//! ```rust
//! use marker::error::MarkerError;
//!
//! fn pattern_of(config: &serde_json::Value) -> Result<&str, MarkerError> {
//!     config["pattern"]
//!         .as_str()
//!         .ok_or_else(|| MarkerError::InvalidConfig("missing 'pattern'".to_string()))
//! }
//! ```

/// Represents all error types that can occur while marking a criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// Criterion configuration is missing a field or has the wrong shape.
    InvalidConfig(String),
    /// The answer payload cannot be interpreted by this strategy.
    InvalidAnswer(String),
    /// The configured regular expression does not compile.
    InvalidPattern(String),
    /// The criterion can only be marked by a person.
    ManualMarkingRequired,
    /// The strategy panicked while marking.
    Panicked(String),
}

impl std::fmt::Display for MarkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerError::InvalidConfig(msg) => write!(f, "Invalid criterion config: {}", msg),
            MarkerError::InvalidAnswer(msg) => write!(f, "Invalid answer: {}", msg),
            MarkerError::InvalidPattern(msg) => write!(f, "Invalid pattern: {}", msg),
            MarkerError::ManualMarkingRequired => write!(f, "Criterion requires manual marking"),
            MarkerError::Panicked(msg) => write!(f, "Strategy panicked: {}", msg),
        }
    }
}

impl std::error::Error for MarkerError {}
