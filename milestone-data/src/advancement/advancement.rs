use milestone_util::resource_location::ResourceLocation;
use milestone_util::text::TextComponent;
use serde::Serialize;

use super::{
    AdvancementCriterion, AdvancementDisplay, AdvancementRequirements, AdvancementRewards,
    CriteriaMap, CriterionTree, TriggerRegistry,
};
use crate::CriterionError;

/// A complete advancement definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advancement {
    /// The parent advancement ID. `None` for root advancements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceLocation>,
    /// Display information. `None` for advancements that never show up in the
    /// advancement screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<AdvancementDisplay>,
    #[serde(skip_serializing_if = "AdvancementRewards::is_empty")]
    pub rewards: AdvancementRewards,
    pub criteria: CriteriaMap,
    pub requirements: AdvancementRequirements,
    pub sends_telemetry_event: bool,
}

impl Advancement {
    /// Creates an advancement requiring every one of `criteria`.
    #[must_use]
    pub fn new(criteria: CriteriaMap) -> Self {
        Self::builder().criteria(criteria).build()
    }

    /// Creates a root advancement (no parent) with display information.
    #[must_use]
    pub fn root(display: AdvancementDisplay, criteria: CriteriaMap) -> Self {
        Self::builder().display(display).criteria(criteria).build()
    }

    #[must_use]
    pub fn builder() -> AdvancementBuilder {
        AdvancementBuilder::new()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Compiles the criteria into a [`CriterionTree`]. The definition is left
    /// untouched.
    pub fn compile(&self, triggers: &TriggerRegistry) -> Result<CriterionTree, CriterionError> {
        CriterionTree::build(&self.requirements, &self.criteria, triggers)
    }
}

/// An advancement entry with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancementEntry {
    pub id: ResourceLocation,
    pub advancement: Advancement,
}

impl AdvancementEntry {
    #[must_use]
    pub fn new(id: ResourceLocation, advancement: Advancement) -> Self {
        Self { id, advancement }
    }

    /// The two lines of the toast shown on completion: the frame header and
    /// the title, or a generic header and the id when there is no display.
    #[must_use]
    pub fn toast_text(&self) -> [TextComponent; 2] {
        match &self.advancement.display {
            Some(display) => [
                TextComponent::translate(display.frame.toast_key(), Vec::new()),
                display.title.clone(),
            ],
            None => [
                TextComponent::text("Unlocked advancement"),
                TextComponent::text(self.id.to_string()),
            ],
        }
    }

    /// Human readable name: the display title if any, else the id.
    #[must_use]
    pub fn name(&self) -> String {
        self.advancement
            .display
            .as_ref()
            .map_or_else(|| self.id.to_string(), |display| display.title.to_plain())
    }
}

/// Builder for constructing advancements.
#[derive(Debug, Default)]
pub struct AdvancementBuilder {
    parent: Option<ResourceLocation>,
    display: Option<AdvancementDisplay>,
    rewards: AdvancementRewards,
    criteria: CriteriaMap,
    requirements: Option<AdvancementRequirements>,
    sends_telemetry_event: bool,
}

impl AdvancementBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn parent(mut self, parent: ResourceLocation) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn display(mut self, display: AdvancementDisplay) -> Self {
        self.display = Some(display);
        self
    }

    #[must_use]
    pub fn rewards(mut self, rewards: AdvancementRewards) -> Self {
        self.rewards = rewards;
        self
    }

    #[must_use]
    pub fn criterion(mut self, name: impl Into<String>, criterion: AdvancementCriterion) -> Self {
        self.criteria.insert(name.into(), criterion);
        self
    }

    #[must_use]
    pub fn criteria(mut self, criteria: CriteriaMap) -> Self {
        self.criteria.extend(criteria);
        self
    }

    /// Sets the requirement groups. Without this every criterion becomes its
    /// own group.
    #[must_use]
    pub fn requirements(mut self, requirements: AdvancementRequirements) -> Self {
        self.requirements = Some(requirements);
        self
    }

    #[must_use]
    pub fn sends_telemetry_event(mut self) -> Self {
        self.sends_telemetry_event = true;
        self
    }

    #[must_use]
    pub fn build(self) -> Advancement {
        let requirements = self
            .requirements
            .unwrap_or_else(|| AdvancementRequirements::all_of(self.criteria.keys().cloned()));

        Advancement {
            parent: self.parent,
            display: self.display,
            rewards: self.rewards,
            criteria: self.criteria,
            requirements,
            sends_telemetry_event: self.sends_telemetry_event,
        }
    }

    #[must_use]
    pub fn build_entry(self, id: ResourceLocation) -> AdvancementEntry {
        AdvancementEntry::new(id, self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advancement::{AdvancementFrame, AdvancementIcon, CriterionKind};
    use milestone_util::text::TextContent;

    fn display(title: &str) -> AdvancementDisplay {
        AdvancementDisplay::new(
            AdvancementIcon::simple(ResourceLocation::vanilla("dirt")),
            TextComponent::text(title),
            TextComponent::text("description"),
        )
    }

    #[test]
    fn builder_defaults_to_all_criteria() {
        let advancement = Advancement::builder()
            .criterion("b", AdvancementCriterion::dummy())
            .criterion("a", AdvancementCriterion::score(3))
            .build();
        assert_eq!(advancement.requirements.requirements, vec![vec!["a"], vec!["b"]]);
        assert!(advancement.is_root());
        assert!(!advancement.has_display());
    }

    #[test]
    fn toast_text_with_display() {
        let entry = Advancement::builder()
            .display(display("Counter").frame(AdvancementFrame::Challenge))
            .build_entry(ResourceLocation::new("milestone", "counter"));
        let [header, title] = entry.toast_text();
        assert_eq!(
            header.content,
            TextContent::Translate {
                key: "advancements.toast.challenge".to_string(),
                with: Vec::new()
            }
        );
        assert_eq!(title, TextComponent::text("Counter"));
        assert_eq!(entry.name(), "Counter");
    }

    #[test]
    fn toast_text_without_display() {
        let entry =
            Advancement::builder().build_entry(ResourceLocation::new("milestone", "hidden"));
        let [header, id] = entry.toast_text();
        assert_eq!(header.to_plain(), "Unlocked advancement");
        assert_eq!(id.to_plain(), "milestone:hidden");
    }

    #[test]
    fn compiling_does_not_touch_the_definition() {
        let advancement = Advancement::builder()
            .criterion("counter", AdvancementCriterion::score(4))
            .criterion("bypass", AdvancementCriterion::dummy())
            .requirements(AdvancementRequirements::any_of([
                "counter".to_string(),
                "bypass".to_string(),
            ]))
            .build();
        let before = advancement.clone();

        let tree = advancement.compile(&TriggerRegistry::vanilla()).unwrap();

        assert_eq!(advancement, before);
        assert_eq!(tree.kind("counter"), Some(&CriterionKind::Score { goal: 4 }));
        assert_eq!(tree.stored_names().len(), 4);
    }
}
