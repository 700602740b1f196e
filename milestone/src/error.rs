use std::path::PathBuf;

use milestone_data::CriterionError;
use milestone_util::resource_location::{ResourceLocation, ResourceLocationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("advancement {id} is corrupt: {source}")]
    Criterion {
        id: ResourceLocation,
        #[source]
        source: CriterionError,
    },
    #[error("advancement {0} is already registered")]
    Duplicate(ResourceLocation),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt progress file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{0}` is not a valid player name")]
    InvalidPlayerName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors reported back to whoever typed a console command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown advancement: {0}")]
    UnknownAdvancement(ResourceLocation),
    #[error("Advancement {advancement} has no criterion `{criterion}`")]
    UnknownCriterion {
        advancement: ResourceLocation,
        criterion: String,
    },
    #[error("Unknown trigger: {0}")]
    UnknownTrigger(ResourceLocation),
    #[error("Invalid number `{0}`")]
    InvalidNumber(String),
    #[error(transparent)]
    ResourceLocation(#[from] ResourceLocationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
