use milestone_data::advancement::TriggerContext;

use super::{AdvancementEvent, AdvancementRegistry, PlayerAdvancementTracker};

pub struct AdvancementTriggers;

impl AdvancementTriggers {
    /// Grants every not yet obtained criterion the event completes, across
    /// all advancements in id order.
    pub fn trigger(
        registry: &AdvancementRegistry,
        tracker: &mut PlayerAdvancementTracker,
        context: &TriggerContext,
    ) -> Vec<AdvancementEvent> {
        let mut events = Vec::new();
        for id in registry.ids() {
            let Some(placed) = registry.get(&id) else {
                continue;
            };
            let mut matched: Vec<&str> = placed
                .entry
                .advancement
                .criteria
                .iter()
                .filter(|(_, criterion)| registry.triggers().matches(criterion, context))
                .map(|(name, _)| name.as_str())
                .collect();
            matched.sort_unstable();

            for name in matched {
                if tracker
                    .get_progress(&id)
                    .is_some_and(|progress| placed.tree.is_criterion_done(progress, name))
                {
                    continue;
                }
                events.extend(tracker.grant_criterion(registry, &id, name));
            }
        }
        if !events.is_empty() {
            log::debug!(
                "{} triggered {} advancement event(s) for {}",
                context.trigger,
                events.len(),
                tracker.player()
            );
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advancement::registry::tests::id;
    use milestone_data::advancement::{
        Advancement, AdvancementCriterion, CriterionConditions, TriggerRegistry,
    };
    use milestone_util::resource_location::ResourceLocation;
    use std::collections::HashMap;

    fn dirt_registry() -> AdvancementRegistry {
        let mut registry = AdvancementRegistry::new(TriggerRegistry::vanilla());
        for (path, count) in [("some_dirt", 1), ("lots_of_dirt", 64)] {
            let conditions = CriterionConditions::from_json(serde_json::json!({
                "items": [{"items": "minecraft:dirt", "count": {"min": count}}]
            }));
            registry
                .register(
                    Advancement::builder()
                        .criterion(
                            "dirt",
                            AdvancementCriterion::with_conditions(
                                ResourceLocation::vanilla("inventory_changed"),
                                conditions,
                            ),
                        )
                        .build_entry(id(path)),
                )
                .unwrap();
        }
        registry
    }

    #[test]
    fn matching_criteria_are_granted() {
        let registry = dirt_registry();
        let mut tracker = PlayerAdvancementTracker::new("Alex");
        tracker.load(&registry, HashMap::new());

        let context = TriggerContext::new(ResourceLocation::vanilla("inventory_changed"))
            .with_item("minecraft:dirt", 10);
        let events = AdvancementTriggers::trigger(&registry, &mut tracker, &context);
        assert!(events.contains(&AdvancementEvent::Achieved {
            player: "Alex".to_string(),
            advancement: id("some_dirt"),
        }));
        assert!(!tracker.is_completed(&id("lots_of_dirt")));

        assert!(AdvancementTriggers::trigger(&registry, &mut tracker, &context).is_empty());
    }

    #[test]
    fn other_triggers_are_ignored() {
        let registry = dirt_registry();
        let mut tracker = PlayerAdvancementTracker::new("Alex");
        tracker.load(&registry, HashMap::new());

        let context = TriggerContext::new(ResourceLocation::vanilla("consume_item"))
            .with_item("minecraft:dirt", 64);
        assert!(AdvancementTriggers::trigger(&registry, &mut tracker, &context).is_empty());
    }
}
