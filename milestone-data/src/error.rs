use std::path::PathBuf;

use milestone_util::resource_location::{ResourceLocation, ResourceLocationError};
use thiserror::Error;

use crate::advancement::MAX_SCORE_GOAL;

/// Raised while compiling an advancement's criteria into a criterion tree.
///
/// Every variant means the advancement definition itself is corrupt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriterionError {
    #[error("requirements reference unknown criterion `{0}`")]
    UnknownCriterion(String),
    #[error("criterion `{name}` uses unregistered trigger `{trigger}`")]
    UnknownTrigger {
        name: String,
        trigger: ResourceLocation,
    },
    #[error("score criterion `{0}` is missing an integer `score` condition")]
    MissingScoreGoal(String),
    #[error("score criterion `{name}` has goal {goal}, above {max}", max = MAX_SCORE_GOAL)]
    ScoreGoalTooLarge { name: String, goal: i32 },
    #[error("criterion name `{0}` collides with the score unit naming scheme")]
    ReservedName(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse advancement {id}: {source}")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid resource location: {0}")]
    ResourceLocation(#[from] ResourceLocationError),
    #[error("{0} is not a datapack directory")]
    NotADatapack(PathBuf),
}
