use milestone_util::resource_location::ResourceLocation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A criterion as written in an advancement definition: a trigger id plus
/// trigger-specific conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementCriterion {
    pub trigger: ResourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<CriterionConditions>,
}

impl AdvancementCriterion {
    #[must_use]
    pub fn new(trigger: ResourceLocation) -> Self {
        Self {
            trigger,
            conditions: None,
        }
    }

    #[must_use]
    pub fn with_conditions(trigger: ResourceLocation, conditions: CriterionConditions) -> Self {
        Self {
            trigger,
            conditions: Some(conditions),
        }
    }

    /// A `milestone:score` criterion completed after `goal` points.
    #[must_use]
    pub fn score(goal: i32) -> Self {
        let mut conditions = CriterionConditions::empty();
        conditions
            .other
            .insert("score".to_string(), serde_json::Value::from(goal));
        Self::with_conditions(super::score_trigger(), conditions)
    }

    /// A `milestone:dummy` criterion, satisfied without any progress.
    #[must_use]
    pub fn dummy() -> Self {
        Self::new(super::dummy_trigger())
    }
}

/// Conditions for a criterion trigger.
///
/// The layout depends on the trigger type, so everything except the common
/// `player` predicate is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<serde_json::Value>,
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

impl CriterionConditions {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits a raw conditions object into the player predicate and the rest.
    /// Anything that is not an object yields empty conditions.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(mut obj) = value else {
            return Self::empty();
        };
        let player = obj.remove("player");
        Self {
            player,
            other: obj.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.other.get(key)
    }

    #[must_use]
    pub fn get_items(&self) -> Option<&serde_json::Value> {
        self.other.get("items").or_else(|| self.other.get("item"))
    }

    #[must_use]
    pub fn get_entity(&self) -> Option<&serde_json::Value> {
        self.other.get("entity")
    }

    #[must_use]
    pub fn get_block(&self) -> Option<&serde_json::Value> {
        self.other.get("block")
    }

    #[must_use]
    pub fn get_distance(&self) -> Option<&serde_json::Value> {
        self.other.get("distance")
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.other.get(key).and_then(serde_json::Value::as_str)
    }

    /// Minimum level, written either as a plain integer or `{"min": n}`.
    #[must_use]
    pub fn get_min(&self, key: &str) -> Option<i64> {
        self.other.get(key).and_then(|v| {
            v.as_object().map_or_else(
                || v.as_i64(),
                |obj| obj.get("min").and_then(serde_json::Value::as_i64),
            )
        })
    }

    /// Goal of a score criterion.
    #[must_use]
    pub fn get_score(&self) -> Option<i32> {
        self.other
            .get("score")
            .and_then(serde_json::Value::as_i64)
            .and_then(|score| i32::try_from(score).ok())
    }
}

/// A map of criterion names to their definitions.
pub type CriteriaMap = HashMap<String, AdvancementCriterion>;

/// What a criterion compiles to inside a [`super::CriterionTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionKind {
    /// Always satisfied; never stored.
    Dummy,
    /// Counter criterion completed after `goal` points.
    Score { goal: i32 },
    /// A boolean criterion granted by its trigger or by hand.
    Defaulted { trigger: ResourceLocation },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_split_player_predicate() {
        let conditions = CriterionConditions::from_json(serde_json::json!({
            "player": [{"condition": "minecraft:entity_properties"}],
            "items": [{"items": "minecraft:dirt"}],
            "level": {"min": 4},
        }));
        assert!(conditions.player.is_some());
        assert!(conditions.get_items().is_some());
        assert_eq!(conditions.get_min("level"), Some(4));
        assert!(!conditions.other.contains_key("player"));
    }

    #[test]
    fn score_goal_is_read_from_conditions() {
        let criterion = AdvancementCriterion::score(10);
        assert_eq!(
            criterion.conditions.as_ref().and_then(CriterionConditions::get_score),
            Some(10)
        );
        assert_eq!(CriterionConditions::from_json(serde_json::json!(3)).get_score(), None);
    }
}
