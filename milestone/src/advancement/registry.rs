use std::collections::HashMap;
use std::path::Path;

use milestone_data::LoadError;
use milestone_data::advancement::{
    AdvancementEntry, CriterionTree, TriggerRegistry, TriggerType, load_datapack,
};
use milestone_util::resource_location::ResourceLocation;

use crate::error::RegistryError;

/// A registered advancement with its compiled criteria and its place in the
/// advancement tree.
#[derive(Debug, Clone)]
pub struct PlacedAdvancement {
    pub entry: AdvancementEntry,
    pub tree: CriterionTree,
    /// Registered children, sorted by id.
    pub children: Vec<ResourceLocation>,
}

impl PlacedAdvancement {
    #[must_use]
    pub fn id(&self) -> &ResourceLocation {
        &self.entry.id
    }

    #[must_use]
    pub fn parent(&self) -> Option<&ResourceLocation> {
        self.entry.advancement.parent.as_ref()
    }

    fn add_child(&mut self, child: ResourceLocation) {
        if let Err(index) = self.children.binary_search(&child) {
            self.children.insert(index, child);
        }
    }
}

#[derive(Debug, Default)]
pub struct AdvancementRegistry {
    triggers: TriggerRegistry,
    advancements: HashMap<ResourceLocation, PlacedAdvancement>,
    roots: Vec<ResourceLocation>,
}

impl AdvancementRegistry {
    #[must_use]
    pub fn new(triggers: TriggerRegistry) -> Self {
        Self {
            triggers,
            advancements: HashMap::new(),
            roots: Vec::new(),
        }
    }

    #[must_use]
    pub const fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    /// Adds a trigger type. Only affects advancements registered afterwards.
    pub fn register_trigger(&mut self, trigger: TriggerType) {
        self.triggers.register(trigger);
    }

    /// Compiles and registers an advancement.
    ///
    /// The advancement is linked under its parent when the parent is already
    /// registered; otherwise the link is made once the parent arrives.
    pub fn register(&mut self, entry: AdvancementEntry) -> Result<(), RegistryError> {
        let id = entry.id.clone();
        if self.advancements.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        let tree = entry
            .advancement
            .compile(&self.triggers)
            .map_err(|source| RegistryError::Criterion {
                id: id.clone(),
                source,
            })?;

        let mut placed = PlacedAdvancement {
            entry,
            tree,
            children: Vec::new(),
        };
        for (child_id, child) in &self.advancements {
            if child.parent() == Some(&id) {
                placed.add_child(child_id.clone());
            }
        }

        match placed.parent().cloned() {
            Some(parent) => {
                if let Some(parent) = self.advancements.get_mut(&parent) {
                    parent.add_child(id.clone());
                }
            }
            None => {
                if let Err(index) = self.roots.binary_search(&id) {
                    self.roots.insert(index, id.clone());
                }
            }
        }

        log::debug!("Registered advancement {id}");
        self.advancements.insert(id, placed);
        Ok(())
    }

    /// Registers every advancement of a datapack directory. Corrupt
    /// definitions are logged and skipped; returns how many were registered.
    pub fn load_datapack(&mut self, path: &Path) -> Result<usize, LoadError> {
        let loaded = load_datapack(path)?;
        let mut registered = 0;
        for entry in loaded.entries {
            match self.register(entry) {
                Ok(()) => registered += 1,
                Err(err) => log::warn!("{err}"),
            }
        }
        Ok(registered)
    }

    #[must_use]
    pub fn get(&self, id: &ResourceLocation) -> Option<&PlacedAdvancement> {
        self.advancements.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ResourceLocation) -> bool {
        self.advancements.contains_key(id)
    }

    /// Root advancements, sorted by id.
    #[must_use]
    pub fn roots(&self) -> &[ResourceLocation] {
        &self.roots
    }

    #[must_use]
    pub fn children(&self, id: &ResourceLocation) -> &[ResourceLocation] {
        self.advancements
            .get(id)
            .map_or(&[], |placed| placed.children.as_slice())
    }

    /// Walks up the parent chain, nearest first. Stops at an unregistered
    /// parent or a cycle.
    #[must_use]
    pub fn ancestors(&self, id: &ResourceLocation) -> Vec<ResourceLocation> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id).and_then(PlacedAdvancement::parent);
        while let Some(parent) = current {
            if parent == id || ancestors.contains(parent) || !self.contains(parent) {
                break;
            }
            ancestors.push(parent.clone());
            current = self.get(parent).and_then(PlacedAdvancement::parent);
        }
        ancestors
    }

    /// Every advancement below `id`, depth first.
    #[must_use]
    pub fn descendants(&self, id: &ResourceLocation) -> Vec<ResourceLocation> {
        let mut descendants = Vec::new();
        let mut stack: Vec<&ResourceLocation> = self.children(id).iter().rev().collect();
        while let Some(next) = stack.pop() {
            if next == id || descendants.contains(next) {
                continue;
            }
            descendants.push(next.clone());
            stack.extend(self.children(next).iter().rev());
        }
        descendants
    }

    /// All registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<ResourceLocation> {
        let mut ids: Vec<ResourceLocation> = self.advancements.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceLocation, &PlacedAdvancement)> {
        self.advancements.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.advancements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.advancements.is_empty()
    }

    pub fn clear(&mut self) {
        self.advancements.clear();
        self.roots.clear();
    }

    /// Assigns tab positions to every displayed advancement: `x` is the depth
    /// below the root, leaves take consecutive rows and a parent sits midway
    /// between its first and last displayed child.
    pub fn layout(&mut self) {
        for root in self.roots.clone() {
            let mut next_row = 0.0;
            self.place(&root, 0.0, &mut next_row);
        }
    }

    fn place(&mut self, id: &ResourceLocation, depth: f32, next_row: &mut f32) -> Option<f32> {
        let placed = self.advancements.get(id)?;
        placed.entry.advancement.display.as_ref()?;
        let children = placed.children.clone();

        let rows: Vec<f32> = children
            .iter()
            .filter_map(|child| self.place(child, depth + 1.0, next_row))
            .collect();
        let y = if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
            (first + last) / 2.0
        } else {
            let row = *next_row;
            *next_row += 1.0;
            row
        };

        if let Some(display) = self
            .advancements
            .get_mut(id)
            .and_then(|placed| placed.entry.advancement.display.as_mut())
        {
            display.set_pos(depth, y);
        }
        Some(y)
    }
}
