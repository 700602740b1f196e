use std::collections::{HashMap, HashSet};

use milestone_data::advancement::{AdvancementProgress, CriterionKind};
use milestone_util::resource_location::ResourceLocation;

use super::{AdvancementEvent, AdvancementRegistry, PlacedAdvancement};

/// One player's progress over every registered advancement.
///
/// Every mutation takes the registry the progress belongs to and returns the
/// events it caused, criterion changes first and completion changes last.
#[derive(Debug)]
pub struct PlayerAdvancementTracker {
    player: String,
    progress: HashMap<ResourceLocation, AdvancementProgress>,
    completed: HashSet<ResourceLocation>,
    /// Advancements changed since the last [`Self::take_dirty`].
    dirty: HashSet<ResourceLocation>,
    visible: HashSet<ResourceLocation>,
}

impl PlayerAdvancementTracker {
    #[must_use]
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            progress: HashMap::new(),
            completed: HashSet::new(),
            dirty: HashSet::new(),
            visible: HashSet::new(),
        }
    }

    #[must_use]
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Replaces all progress with saved data.
    ///
    /// Advancements that were complete in the save are restored silently.
    /// Anything that became complete through the load itself (e.g. an
    /// advancement made only of dummy criteria) is reported as achieved.
    pub fn load(
        &mut self,
        registry: &AdvancementRegistry,
        saved: HashMap<ResourceLocation, AdvancementProgress>,
    ) -> Vec<AdvancementEvent> {
        self.progress.clear();
        self.completed.clear();
        self.dirty.clear();

        for (id, mut progress) in saved {
            let Some(placed) = registry.get(&id) else {
                log::debug!("Dropping progress of {} for unknown advancement {id}", self.player);
                continue;
            };
            progress.init(&placed.tree);
            if progress.is_done() {
                self.completed.insert(id.clone());
            }
            self.progress.insert(id, progress);
        }
        self.refresh(registry)
    }

    /// Brings progress in line with the registry: creates entries for new
    /// advancements, drops removed ones and reports completion changes.
    pub fn refresh(&mut self, registry: &AdvancementRegistry) -> Vec<AdvancementEvent> {
        self.progress.retain(|id, _| registry.contains(id));
        self.completed.retain(|id| registry.contains(id));

        let mut events = Vec::new();
        for id in registry.ids() {
            let Some(placed) = registry.get(&id) else {
                continue;
            };
            self.progress
                .entry(id.clone())
                .or_default()
                .init(&placed.tree);
            self.update_completion(&id, &mut events);
        }
        self.update_visibility(registry);
        events
    }

    #[must_use]
    pub fn get_progress(&self, id: &ResourceLocation) -> Option<&AdvancementProgress> {
        self.progress.get(id)
    }

    #[must_use]
    pub fn is_completed(&self, id: &ResourceLocation) -> bool {
        self.completed.contains(id)
    }

    #[must_use]
    pub fn completed_advancements(&self) -> &HashSet<ResourceLocation> {
        &self.completed
    }

    #[must_use]
    pub fn is_visible(&self, id: &ResourceLocation) -> bool {
        self.visible.contains(id)
    }

    #[must_use]
    pub fn visible_advancements(&self) -> &HashSet<ResourceLocation> {
        &self.visible
    }

    /// Completion ratio of one advancement, 0.0 for unknown ones.
    #[must_use]
    pub fn percent(&self, registry: &AdvancementRegistry, id: &ResourceLocation) -> f32 {
        match (registry.get(id), self.progress.get(id)) {
            (Some(placed), Some(progress)) => progress.get_percent(&placed.tree),
            _ => 0.0,
        }
    }

    /// Current counter of a criterion, see [`milestone_data::advancement::CriterionTree::score`].
    #[must_use]
    pub fn score(
        &self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
        criterion: &str,
    ) -> Option<u32> {
        let placed = registry.get(id)?;
        placed.tree.score(self.progress.get(id)?, criterion)
    }

    pub fn grant_criterion(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
        criterion: &str,
    ) -> Vec<AdvancementEvent> {
        let player = self.player.clone();
        self.mutate(registry, id, |placed, progress, events| {
            if placed.tree.grant(progress, criterion) {
                events.push(AdvancementEvent::CriterionGranted {
                    player,
                    advancement: id.clone(),
                    criterion: criterion.to_string(),
                });
            }
        })
    }

    pub fn revoke_criterion(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
        criterion: &str,
    ) -> Vec<AdvancementEvent> {
        let player = self.player.clone();
        self.mutate(registry, id, |placed, progress, events| {
            if placed.tree.revoke(progress, criterion) {
                events.push(AdvancementEvent::CriterionRevoked {
                    player,
                    advancement: id.clone(),
                    criterion: criterion.to_string(),
                });
            }
        })
    }

    /// Adds `delta` to a criterion's counter, saturating at its goal.
    pub fn add_score(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
        criterion: &str,
        delta: i32,
    ) -> Vec<AdvancementEvent> {
        let player = self.player.clone();
        self.mutate(registry, id, |placed, progress, events| {
            let old = placed.tree.score(progress, criterion);
            let new = placed.tree.add(progress, criterion, delta);
            if let (Some(old), Some(new)) = (old, new) {
                push_counter_change(placed, player, id, criterion, old, new, events);
            }
        })
    }

    pub fn set_score(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
        criterion: &str,
        score: u32,
    ) -> Vec<AdvancementEvent> {
        let player = self.player.clone();
        self.mutate(registry, id, |placed, progress, events| {
            let Some(old) = placed.tree.score(progress, criterion) else {
                log::warn!("Tried to set the score of unknown criterion `{criterion}` of {id}");
                return;
            };
            if placed.tree.set_score(progress, criterion, score) {
                let new = placed.tree.score(progress, criterion).unwrap_or(old);
                push_counter_change(placed, player, id, criterion, old, new, events);
            }
        })
    }

    /// Grants every criterion of an advancement.
    pub fn grant_advancement(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
    ) -> Vec<AdvancementEvent> {
        let player = self.player.clone();
        self.mutate(registry, id, |placed, progress, events| {
            let names: Vec<String> = placed.tree.criterion_names().map(str::to_string).collect();
            for name in names {
                if placed.tree.grant(progress, &name) {
                    events.push(AdvancementEvent::CriterionGranted {
                        player: player.clone(),
                        advancement: id.clone(),
                        criterion: name,
                    });
                }
            }
        })
    }

    /// Revokes every criterion of an advancement.
    pub fn revoke_advancement(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
    ) -> Vec<AdvancementEvent> {
        let player = self.player.clone();
        self.mutate(registry, id, |placed, progress, events| {
            let names: Vec<String> = placed.tree.criterion_names().map(str::to_string).collect();
            for name in names {
                if placed.tree.revoke(progress, &name) {
                    events.push(AdvancementEvent::CriterionRevoked {
                        player: player.clone(),
                        advancement: id.clone(),
                        criterion: name,
                    });
                }
            }
        })
    }

    /// Progress worth writing to disk: anything with an obtained criterion
    /// or marked complete.
    pub fn saved_progress(
        &self,
    ) -> impl Iterator<Item = (&ResourceLocation, &AdvancementProgress)> {
        self.progress
            .iter()
            .filter(|(id, progress)| progress.has_progress() || self.completed.contains(*id))
    }

    #[must_use]
    pub fn has_pending_updates(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the advancements changed since the last call, sorted.
    pub fn take_dirty(&mut self) -> Vec<ResourceLocation> {
        let mut dirty: Vec<ResourceLocation> = self.dirty.drain().collect();
        dirty.sort_unstable();
        dirty
    }

    fn mutate<F>(
        &mut self,
        registry: &AdvancementRegistry,
        id: &ResourceLocation,
        change: F,
    ) -> Vec<AdvancementEvent>
    where
        F: FnOnce(&PlacedAdvancement, &mut AdvancementProgress, &mut Vec<AdvancementEvent>),
    {
        let mut events = Vec::new();
        let Some(placed) = registry.get(id) else {
            log::warn!("Tried to change progress of unknown advancement {id}");
            return events;
        };

        let progress = self.progress.entry(id.clone()).or_insert_with(|| {
            let mut progress = AdvancementProgress::new();
            progress.init(&placed.tree);
            progress
        });
        change(placed, progress, &mut events);
        progress.update_done(&placed.tree);

        if !events.is_empty() {
            self.dirty.insert(id.clone());
        }
        if self.update_completion(id, &mut events) {
            self.update_visibility(registry);
        }
        events
    }

    /// Syncs the completed set with the cached state of `id`. Returns whether
    /// it changed.
    fn update_completion(
        &mut self,
        id: &ResourceLocation,
        events: &mut Vec<AdvancementEvent>,
    ) -> bool {
        let done = self.progress.get(id).is_some_and(AdvancementProgress::is_done);
        let event = if done && self.completed.insert(id.clone()) {
            AdvancementEvent::Achieved {
                player: self.player.clone(),
                advancement: id.clone(),
            }
        } else if !done && self.completed.remove(id) {
            AdvancementEvent::Revoked {
                player: self.player.clone(),
                advancement: id.clone(),
            }
        } else {
            return false;
        };
        events.push(event);
        self.dirty.insert(id.clone());
        true
    }

    fn update_visibility(&mut self, registry: &AdvancementRegistry) {
        let visible: HashSet<ResourceLocation> = registry
            .ids()
            .into_iter()
            .filter(|id| self.should_be_visible(registry, id))
            .collect();
        self.visible = visible;
    }

    /// Completed advancements are always shown. Otherwise a displayed,
    /// non-hidden advancement is shown when it is a root or its parent or
    /// grandparent is complete.
    fn should_be_visible(&self, registry: &AdvancementRegistry, id: &ResourceLocation) -> bool {
        let Some(display) = registry
            .get(id)
            .and_then(|placed| placed.entry.advancement.display.as_ref())
        else {
            return false;
        };
        if self.completed.contains(id) {
            return true;
        }
        if display.hidden {
            return false;
        }
        let ancestors = registry.ancestors(id);
        ancestors.is_empty()
            || ancestors
                .iter()
                .take(2)
                .any(|ancestor| self.completed.contains(ancestor))
    }
}

fn push_counter_change(
    placed: &PlacedAdvancement,
    player: String,
    id: &ResourceLocation,
    criterion: &str,
    old: u32,
    new: u32,
    events: &mut Vec<AdvancementEvent>,
) {
    if old == new {
        return;
    }
    let advancement = id.clone();
    let criterion = criterion.to_string();
    let event = match placed.tree.kind(&criterion) {
        Some(CriterionKind::Score { .. }) => AdvancementEvent::ScoreChanged {
            goal: placed
                .tree
                .score_expansion(&criterion)
                .map_or(0, |score| score.goal()),
            player,
            advancement,
            criterion,
            old,
            new,
        },
        _ if new > old => AdvancementEvent::CriterionGranted {
            player,
            advancement,
            criterion,
        },
        _ => AdvancementEvent::CriterionRevoked {
            player,
            advancement,
            criterion,
        },
    };
    events.push(event);
}
