use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use milestone_data::advancement::AdvancementProgress;
use milestone_util::resource_location::ResourceLocation;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// On-disk layout of one player's progress file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PlayerSave {
    #[serde(default)]
    advancements: BTreeMap<ResourceLocation, AdvancementProgress>,
}

/// Reads and writes `<dir>/<player>.json`.
#[derive(Debug, Clone)]
pub struct PlayerProgressStorage {
    dir: PathBuf,
}

impl PlayerProgressStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, player: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_player_name(player) {
            return Err(StorageError::InvalidPlayerName(player.to_string()));
        }
        Ok(self.dir.join(format!("{player}.json")))
    }

    /// Loads a player's progress. A player without a file has no progress.
    pub fn load(
        &self,
        player: &str,
    ) -> Result<HashMap<ResourceLocation, AdvancementProgress>, StorageError> {
        let path = self.path(player)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        let save: PlayerSave = serde_json::from_str(&contents)
            .map_err(|source| StorageError::Json { path, source })?;
        Ok(save.advancements.into_iter().collect())
    }

    /// Writes a player's progress, replacing the previous file only once the
    /// new one is complete.
    pub fn save<'a>(
        &self,
        player: &str,
        progress: impl IntoIterator<Item = (&'a ResourceLocation, &'a AdvancementProgress)>,
    ) -> Result<(), StorageError> {
        let path = self.path(player)?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let save = PlayerSave {
            advancements: progress
                .into_iter()
                .map(|(id, progress)| (id.clone(), progress.clone()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&save).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }
}

/// Minecraft usernames: 1 to 16 ASCII letters, digits or underscores.
fn is_valid_player_name(name: &str) -> bool {
    (1..=16).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
