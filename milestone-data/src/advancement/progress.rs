use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::CriterionTree;

/// Storage for per-criterion progress of one advancement.
///
/// The criterion tree only reads and writes single named entries through
/// this trait; where the entries live (memory, a save file, a database) is
/// up to the host. Score criteria are stored as one entry per unit.
pub trait ProgressStore {
    fn get(&self, name: &str) -> Option<CriterionProgress>;

    fn set(&mut self, name: &str, state: CriterionProgress);

    fn is_obtained(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.is_obtained())
    }
}

impl ProgressStore for HashMap<String, CriterionProgress> {
    fn get(&self, name: &str) -> Option<CriterionProgress> {
        HashMap::get(self, name).copied()
    }

    fn set(&mut self, name: &str, state: CriterionProgress) {
        if let Some(existing) = self.get_mut(name) {
            *existing = state;
        } else {
            self.insert(name.to_string(), state);
        }
    }
}

/// Tracks the progress of a single advancement for a player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvancementProgress {
    /// Progress for each stored criterion, keyed by criterion or unit name.
    #[serde(default)]
    pub criteria: HashMap<String, CriterionProgress>,
    /// Cached result of the last [`AdvancementProgress::update_done`].
    #[serde(skip)]
    done: bool,
}

impl ProgressStore for AdvancementProgress {
    fn get(&self, name: &str) -> Option<CriterionProgress> {
        self.criteria.get(name).copied()
    }

    fn set(&mut self, name: &str, state: CriterionProgress) {
        ProgressStore::set(&mut self.criteria, name, state);
    }
}

impl AdvancementProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entry for every stored criterion of `tree` and drops
    /// entries the tree no longer knows about, e.g. after a datapack
    /// changed a score goal.
    pub fn init(&mut self, tree: &CriterionTree) {
        let names = tree.stored_names();
        self.criteria.retain(|name, _| names.contains(name));
        for name in names {
            self.criteria.entry(name).or_default();
        }
        self.update_done(tree);
    }

    /// Re-evaluates the tree and caches the result.
    pub fn update_done(&mut self, tree: &CriterionTree) {
        self.done = tree.is_satisfied(self);
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn is_criterion_obtained(&self, criterion: &str) -> bool {
        self.is_obtained(criterion)
    }

    /// Returns all obtained stored names, sorted.
    #[must_use]
    pub fn get_obtained_criteria(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .criteria
            .iter()
            .filter(|(_, p)| p.is_obtained())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns the stored names of `tree` that are not obtained yet, sorted.
    #[must_use]
    pub fn get_remaining_criteria(&self, tree: &CriterionTree) -> Vec<String> {
        let mut remaining: Vec<String> = tree
            .stored_names()
            .into_iter()
            .filter(|name| !self.is_obtained(name))
            .collect();
        remaining.sort_unstable();
        remaining
    }

    /// Completion ratio between 0.0 and 1.0 over the top-level requirement
    /// groups.
    #[must_use]
    pub fn get_percent(&self, tree: &CriterionTree) -> f32 {
        tree.percent(self)
    }

    #[must_use]
    pub fn get_earliest_progress_time(&self) -> Option<i64> {
        self.criteria.values().filter_map(|p| p.obtained_time).min()
    }

    /// Whether any stored criterion is obtained.
    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.criteria.values().any(CriterionProgress::is_obtained)
    }
}

/// Tracks the progress of a single criterion or score unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionProgress {
    /// When the criterion was obtained, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_time: Option<i64>,
}

impl CriterionProgress {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            obtained_time: None,
        }
    }

    #[must_use]
    pub const fn obtained_at(time: i64) -> Self {
        Self {
            obtained_time: Some(time),
        }
    }

    #[must_use]
    pub const fn is_obtained(&self) -> bool {
        self.obtained_time.is_some()
    }

    /// Marks this criterion as obtained now. Keeps the original time when it
    /// was already obtained.
    pub fn obtain(&mut self) {
        if self.obtained_time.is_none() {
            self.obtained_time = Some(current_time_millis());
        }
    }

    pub fn reset(&mut self) {
        self.obtained_time = None;
    }
}

pub(crate) fn current_time_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advancement::{AdvancementRequirements, CriterionKind};
    use milestone_util::resource_location::ResourceLocation;

    fn tree(groups: &[&[&str]]) -> CriterionTree {
        let mut kinds = HashMap::new();
        for group in groups {
            for name in *group {
                kinds.insert(
                    (*name).to_string(),
                    CriterionKind::Defaulted {
                        trigger: ResourceLocation::vanilla("impossible"),
                    },
                );
            }
        }
        let requirements = AdvancementRequirements::new(
            groups
                .iter()
                .map(|g| g.iter().map(|n| (*n).to_string()).collect())
                .collect(),
        );
        CriterionTree::from_kinds(&requirements, &kinds).unwrap()
    }

    #[test]
    fn test_progress_tracking() {
        let tree = tree(&[&["criterion_a"], &["criterion_b"]]);

        let mut progress = AdvancementProgress::new();
        progress.init(&tree);

        assert!(!progress.is_done());
        assert_eq!(progress.get_percent(&tree), 0.0);

        tree.grant(&mut progress, "criterion_a");
        progress.update_done(&tree);
        assert!(!progress.is_done());
        assert_eq!(progress.get_percent(&tree), 0.5);
        assert_eq!(progress.get_remaining_criteria(&tree), vec!["criterion_b"]);

        tree.grant(&mut progress, "criterion_b");
        progress.update_done(&tree);
        assert!(progress.is_done());
        assert_eq!(progress.get_percent(&tree), 1.0);
    }

    #[test]
    fn obtained_criteria_and_earliest_time() {
        let tree = tree(&[&["a"], &["b"], &["c"]]);
        let mut progress = AdvancementProgress::new();
        progress.init(&tree);
        assert!(progress.get_obtained_criteria().is_empty());
        assert_eq!(progress.get_earliest_progress_time(), None);

        ProgressStore::set(&mut progress, "c", CriterionProgress::obtained_at(30));
        ProgressStore::set(&mut progress, "a", CriterionProgress::obtained_at(50));
        assert_eq!(progress.get_obtained_criteria(), ["a", "c"]);
        assert_eq!(progress.get_earliest_progress_time(), Some(30));

        tree.revoke(&mut progress, "c");
        assert_eq!(progress.get_obtained_criteria(), ["a"]);
        assert_eq!(progress.get_earliest_progress_time(), Some(50));
    }

    #[test]
    fn init_drops_stale_entries() {
        let tree = tree(&[&["kept"]]);
        let mut progress = AdvancementProgress::new();
        ProgressStore::set(&mut progress, "stale", CriterionProgress::obtained_at(5));

        progress.init(&tree);

        assert!(progress.criteria.contains_key("kept"));
        assert!(!progress.criteria.contains_key("stale"));
        assert!(!progress.has_progress());
    }

    #[test]
    fn obtain_keeps_first_time() {
        let mut criterion = CriterionProgress::obtained_at(42);
        criterion.obtain();
        assert_eq!(criterion.obtained_time, Some(42));
        criterion.reset();
        assert!(!criterion.is_obtained());
    }

    #[test]
    fn serialized_progress_skips_done_flag() {
        let mut progress = AdvancementProgress::new();
        ProgressStore::set(&mut progress, "a", CriterionProgress::obtained_at(7));
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json, serde_json::json!({"criteria": {"a": {"obtained_time": 7}}}));
    }
}
