//! Advancement definitions and the criterion evaluator.
//!
//! Definitions are loaded from datapack JSON into [`Advancement`]s. When an
//! advancement is registered its criteria and requirement groups are compiled
//! into a [`CriterionTree`], which is then evaluated against a player's
//! [`ProgressStore`].

#[allow(clippy::module_inception)]
mod advancement;
mod criterion;
mod display;
mod frame;
mod loader;
mod progress;
mod requirements;
mod rewards;
mod score;
mod tree;
mod trigger;

pub use advancement::*;
pub use criterion::*;
pub use display::*;
pub use frame::*;
pub use loader::*;
pub use progress::*;
pub use requirements::*;
pub use rewards::*;
pub use score::*;
pub use tree::*;
pub use trigger::*;
