use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A configuration file living in the config directory.
///
/// Loading writes the defaults when the file does not exist yet, so a fresh
/// install ends up with a complete, editable file.
pub trait LoadConfiguration: Default + Serialize + DeserializeOwned {
    fn file_name() -> &'static str;

    fn validate(&self) -> Result<(), ConfigError>;

    fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(Self::file_name());
        let config = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str::<Self>(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            let config = Self::default();
            config.save(config_dir)?;
            config
        };
        config.validate()?;
        Ok(config)
    }

    fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = config_dir.join(Self::file_name());
        let contents = toml::to_string_pretty(self)?;
        fs::create_dir_all(config_dir).map_err(|source| ConfigError::Io {
            path: config_dir.to_path_buf(),
            source,
        })?;
        fs::write(&path, contents).map_err(|source| ConfigError::Io { path, source })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneConfig {
    /// Datapack directories loaded at startup, in order.
    pub datapacks: Vec<PathBuf>,
    /// Directory holding one progress file per player.
    pub player_data: PathBuf,
    /// Seconds between automatic saves; 0 disables autosave.
    pub autosave_interval: u64,
    /// Announce completed advancements whose display asks for it.
    pub announce_advancements: bool,
    pub logging: LoggingConfig,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            datapacks: vec![PathBuf::from("datapacks/milestone")],
            player_data: PathBuf::from("playerdata"),
            autosave_interval: 300,
            announce_advancements: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl LoadConfiguration for MilestoneConfig {
    fn file_name() -> &'static str {
        "milestone.toml"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.player_data.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("`player_data` must not be empty".to_string()));
        }
        if let Some(datapack) = self.datapacks.iter().find(|d| d.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "empty datapack path in `datapacks`: {datapack:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Level used when `RUST_LOG` is not set.
    pub level: String,
    pub timestamp: bool,
    pub color: bool,
    pub threads: bool,
    /// Also write the log to this file. Empty disables the file logger.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            timestamp: true,
            color: true,
            threads: false,
            file: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let config = MilestoneConfig::load(dir.path()).unwrap();
        assert_eq!(config, MilestoneConfig::default());
        assert!(dir.path().join("milestone.toml").exists());

        assert_eq!(MilestoneConfig::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("milestone.toml"),
            "autosave_interval = 0\n[logging]\ncolor = false\n",
        )
        .unwrap();

        let config = MilestoneConfig::load(dir.path()).unwrap();
        assert_eq!(config.autosave_interval, 0);
        assert!(!config.logging.color);
        assert!(config.logging.timestamp);
        assert_eq!(config.player_data, PathBuf::from("playerdata"));
    }

    #[test]
    fn invalid_files_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("milestone.toml");

        fs::write(&path, "autosave_interval = \"soon\"").unwrap();
        assert!(matches!(
            MilestoneConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));

        fs::write(&path, "player_data = \"\"").unwrap();
        assert!(matches!(
            MilestoneConfig::load(dir.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
