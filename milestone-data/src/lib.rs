pub mod advancement;
pub mod error;

pub use error::{CriterionError, LoadError};

/// Namespace of the triggers this crate adds on top of the vanilla set.
pub const MILESTONE_NAMESPACE: &str = "milestone";
