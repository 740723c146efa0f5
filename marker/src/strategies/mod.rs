//! Built-in grading strategies.
//!
//! - [`exact_match`]: whole-answer text comparison.
//! - [`regex_match`]: regular-expression test with optional inversion.
//! - [`multiple_choice`]: selected option indexes must equal the correct ones.
//! - [`manual`]: always hands the criterion to a person.

pub mod exact_match;
pub mod manual;
pub mod multiple_choice;
pub mod regex_match;
