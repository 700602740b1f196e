//! Loads advancement definitions from datapack JSON.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use milestone_util::resource_location::ResourceLocation;
use serde::Deserialize;
use walkdir::WalkDir;

use super::{
    Advancement, AdvancementCriterion, AdvancementDisplay, AdvancementEntry,
    AdvancementRequirements, AdvancementRewards, CriterionConditions,
};
use crate::LoadError;

/// Directory names advancements live under inside `data/<namespace>/`.
/// Newer packs use the singular form.
const ADVANCEMENT_DIRS: [&str; 2] = ["advancement", "advancements"];

#[derive(Debug, Deserialize)]
struct RawAdvancement {
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    display: Option<AdvancementDisplay>,
    #[serde(default)]
    criteria: HashMap<String, RawCriterion>,
    #[serde(default)]
    requirements: Option<Vec<Vec<String>>>,
    #[serde(default)]
    rewards: Option<AdvancementRewards>,
    #[serde(default)]
    sends_telemetry_event: bool,
}

#[derive(Debug, Deserialize)]
struct RawCriterion {
    trigger: String,
    #[serde(default)]
    conditions: Option<serde_json::Value>,
}

fn parse_advancement(
    id: ResourceLocation,
    raw: RawAdvancement,
) -> Result<AdvancementEntry, LoadError> {
    let parent = raw.parent.as_deref().map(ResourceLocation::parse).transpose()?;

    let mut criteria = HashMap::with_capacity(raw.criteria.len());
    for (name, criterion) in raw.criteria {
        let trigger = ResourceLocation::parse(&criterion.trigger)?;
        let criterion = match criterion.conditions {
            Some(conditions) => AdvancementCriterion::with_conditions(
                trigger,
                CriterionConditions::from_json(conditions),
            ),
            None => AdvancementCriterion::new(trigger),
        };
        criteria.insert(name, criterion);
    }

    let requirements = match raw.requirements {
        Some(groups) => AdvancementRequirements::new(groups),
        None => AdvancementRequirements::all_of(criteria.keys().cloned()),
    };

    let advancement = Advancement {
        parent,
        display: raw.display,
        rewards: raw.rewards.unwrap_or_default(),
        criteria,
        requirements,
        sends_telemetry_event: raw.sends_telemetry_event,
    };
    Ok(AdvancementEntry::new(id, advancement))
}

/// Parses a single advancement file's contents.
pub fn load_advancement_from_json(
    id: ResourceLocation,
    json: &str,
) -> Result<AdvancementEntry, LoadError> {
    let raw: RawAdvancement = serde_json::from_str(json).map_err(|source| LoadError::Json {
        id: id.to_string(),
        source,
    })?;
    parse_advancement(id, raw)
}

/// Result of loading a datapack: every definition that parsed, plus the
/// number of files that did not.
#[derive(Debug, Default)]
pub struct DatapackAdvancements {
    pub entries: Vec<AdvancementEntry>,
    pub failed: usize,
}

/// Loads every `data/<namespace>/advancement(s)/**/*.json` under `root`.
///
/// Files are visited in name order. A file that cannot be read or parsed is
/// logged and counted in [`DatapackAdvancements::failed`]; only a missing
/// `data` directory is an error.
pub fn load_datapack(root: &Path) -> Result<DatapackAdvancements, LoadError> {
    let data = root.join("data");
    if !data.is_dir() {
        return Err(LoadError::NotADatapack(root.to_path_buf()));
    }

    let mut loaded = DatapackAdvancements::default();
    let namespaces = fs::read_dir(&data).map_err(|source| LoadError::Io {
        path: data.clone(),
        source,
    })?;
    let mut namespaces: Vec<PathBuf> = namespaces
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    namespaces.sort();

    for namespace_dir in namespaces {
        let Some(namespace) = namespace_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        for dir in ADVANCEMENT_DIRS {
            let dir = namespace_dir.join(dir);
            if dir.is_dir() {
                load_directory(namespace, &dir, &mut loaded);
            }
        }
    }

    log::info!(
        "Loaded {} advancements from {} ({} failed)",
        loaded.entries.len(),
        root.display(),
        loaded.failed
    );
    Ok(loaded)
}

fn load_directory(namespace: &str, dir: &Path, loaded: &mut DatapackAdvancements) {
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match load_file(namespace, dir, path) {
            Ok(advancement) => loaded.entries.push(advancement),
            Err(err) => {
                log::warn!("Skipping advancement {}: {err}", path.display());
                loaded.failed += 1;
            }
        }
    }
}

fn load_file(namespace: &str, dir: &Path, path: &Path) -> Result<AdvancementEntry, LoadError> {
    let relative = path
        .strip_prefix(dir)
        .unwrap_or(path)
        .with_extension("");
    let relative: Vec<&str> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    let id = ResourceLocation::parse(&format!("{namespace}:{}", relative.join("/")))?;

    let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_advancement_from_json(id, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advancement::AdvancementFrame;
    use tempfile::tempdir;

    const COUNTING: &str = r#"{
        "parent": "milestone:root",
        "display": {
            "icon": {"id": "minecraft:paper"},
            "title": "Counting",
            "description": {"translate": "milestone.counting"},
            "frame": "goal"
        },
        "criteria": {
            "counter": {"trigger": "milestone:score", "conditions": {"score": 10}},
            "bypass": {"trigger": "minecraft:impossible"}
        },
        "requirements": [["counter", "bypass"]],
        "rewards": null
    }"#;

    #[test]
    fn parse_single_advancement() {
        let entry =
            load_advancement_from_json(ResourceLocation::new("milestone", "counting"), COUNTING)
                .unwrap();
        let advancement = &entry.advancement;

        assert_eq!(advancement.parent, Some(ResourceLocation::new("milestone", "root")));
        assert_eq!(
            advancement.display.as_ref().map(|d| d.frame),
            Some(AdvancementFrame::Goal)
        );
        assert!(advancement.rewards.is_empty());
        assert_eq!(advancement.requirements.requirements, vec![vec!["counter", "bypass"]]);
        assert_eq!(
            advancement.criteria["counter"]
                .conditions
                .as_ref()
                .and_then(CriterionConditions::get_score),
            Some(10)
        );
    }

    #[test]
    fn omitted_requirements_require_everything() {
        let entry = load_advancement_from_json(
            ResourceLocation::vanilla("story/root"),
            r#"{"criteria": {"b": {"trigger": "tick"}, "a": {"trigger": "minecraft:tick"}}}"#,
        )
        .unwrap();
        assert_eq!(entry.advancement.requirements.requirements, vec![vec!["a"], vec!["b"]]);
        assert_eq!(entry.advancement.criteria["b"].trigger, ResourceLocation::vanilla("tick"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = load_advancement_from_json(ResourceLocation::vanilla("broken"), "{").unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));

        let err = load_advancement_from_json(
            ResourceLocation::vanilla("bad_trigger"),
            r#"{"criteria": {"a": {"trigger": "Not Valid"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::ResourceLocation(_)));
    }

    #[test]
    fn load_datapack_directory() {
        let dir = tempdir().unwrap();
        let advancements = dir.path().join("data/milestone/advancement");
        fs::create_dir_all(advancements.join("nested")).unwrap();
        fs::write(
            advancements.join("root.json"),
            r#"{"criteria": {"free": {"trigger": "milestone:dummy"}}}"#,
        )
        .unwrap();
        fs::write(advancements.join("nested/counting.json"), COUNTING).unwrap();
        fs::write(advancements.join("broken.json"), "not json").unwrap();
        fs::write(advancements.join("notes.txt"), "ignored").unwrap();

        let legacy = dir.path().join("data/other/advancements");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("old.json"), r#"{"criteria": {}}"#).unwrap();

        let loaded = load_datapack(dir.path()).unwrap();
        let ids: Vec<String> = loaded.entries.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, ["milestone:nested/counting", "milestone:root", "other:old"]);
        assert_eq!(loaded.failed, 1);
    }

    #[test]
    fn missing_data_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_datapack(dir.path()),
            Err(LoadError::NotADatapack(_))
        ));
    }
}
