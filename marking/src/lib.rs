//! Marking work-queue.
//!
//! Submissions are broken into grading units (one per answered question and
//! criterion). Every node runs a poller that claims units from the shared
//! store and a pool of workers that mark them with a registered
//! [`marker::GradingStrategy`]. When all units of a submission are resolved
//! the poller stores the weighted submission mark.
//!
//! Nodes coordinate only through the store, so any number of them may run
//! against the same database.

pub mod candidates;
pub mod config;
pub mod error;
pub mod manager;
pub mod node;
pub mod poller;
pub mod shutdown;
pub mod worker;

pub use config::MarkingConfig;
pub use error::MarkingError;
pub use manager::manager::{MarkingManager, ShutdownReport};
pub use node::{NodeState, NodeStatus};
