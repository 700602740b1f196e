use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use milestone_util::resource_location::{MINECRAFT_NAMESPACE, ResourceLocation};
use serde_json::Value;

use super::{AdvancementCriterion, CriterionConditions, CriterionKind, MAX_SCORE_GOAL};
use crate::{CriterionError, MILESTONE_NAMESPACE};

/// Trigger ids shipped with the game. `impossible` is only ever granted by
/// commands.
pub const VANILLA_TRIGGERS: &[&str] = &[
    "impossible",
    "tick",
    "player_killed_entity",
    "entity_killed_player",
    "kill_mob_near_sculk_catalyst",
    "enter_block",
    "location",
    "slept_in_bed",
    "hero_of_the_village",
    "voluntary_exile",
    "slide_down_block",
    "placed_block",
    "any_block_use",
    "default_block_use",
    "inventory_changed",
    "consume_item",
    "using_item",
    "item_used_on_block",
    "filled_bucket",
    "enchanted_item",
    "item_durability_changed",
    "thrown_item_picked_up_by_entity",
    "thrown_item_picked_up_by_player",
    "recipe_unlocked",
    "recipe_crafted",
    "crafter_recipe_crafted",
    "player_hurt_entity",
    "entity_hurt_player",
    "used_totem",
    "shot_crossbow",
    "killed_by_crossbow",
    "target_hit",
    "channeled_lightning",
    "lightning_strike",
    "changed_dimension",
    "nether_travel",
    "fall_from_height",
    "ride_entity_in_lava",
    "started_riding",
    "levitation",
    "fall_after_explosion",
    "avoid_vibration",
    "player_interacted_with_entity",
    "player_sheared_equipment",
    "bred_animals",
    "tame_animal",
    "summoned_entity",
    "cured_zombie_villager",
    "villager_trade",
    "fishing_rod_hooked",
    "allay_drop_item_on_block",
    "brewed_potion",
    "effects_changed",
    "construct_beacon",
    "used_ender_eye",
    "player_generates_container_loot",
    "bee_nest_destroyed",
];

/// `milestone:score`, a counter criterion configured by an integer `score`
/// condition.
#[must_use]
pub fn score_trigger() -> ResourceLocation {
    ResourceLocation::new(MILESTONE_NAMESPACE, "score")
}

/// `milestone:dummy`, a criterion that is always satisfied.
#[must_use]
pub fn dummy_trigger() -> ResourceLocation {
    ResourceLocation::new(MILESTONE_NAMESPACE, "dummy")
}

/// How criteria using a trigger behave inside a criterion tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Granted when a matching game event is dispatched.
    Standard,
    /// Counter criterion split into score units.
    Score,
    /// Always satisfied.
    Dummy,
    /// Never matched by events; only granted by hand.
    Impossible,
}

pub type TriggerMatcher = Arc<dyn Fn(&CriterionConditions, &TriggerContext) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct TriggerType {
    id: ResourceLocation,
    kind: TriggerKind,
    matcher: TriggerMatcher,
}

impl Debug for TriggerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerType")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl TriggerType {
    /// A trigger using [`default_matcher`].
    #[must_use]
    pub fn new(id: ResourceLocation, kind: TriggerKind) -> Self {
        Self {
            id,
            kind,
            matcher: Arc::new(default_matcher),
        }
    }

    #[must_use]
    pub fn with_matcher(
        mut self,
        matcher: impl Fn(&CriterionConditions, &TriggerContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    #[must_use]
    pub const fn id(&self) -> &ResourceLocation {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Whether an event described by `context` completes `criterion`. Only
    /// standard triggers ever match; criteria without conditions match every
    /// event of their trigger.
    #[must_use]
    pub fn matches(&self, criterion: &AdvancementCriterion, context: &TriggerContext) -> bool {
        if self.kind != TriggerKind::Standard {
            return false;
        }
        criterion
            .conditions
            .as_ref()
            .is_none_or(|conditions| (self.matcher)(conditions, context))
    }
}

/// The trigger types criteria may reference.
///
/// Owned by whoever registers advancements.
#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    triggers: HashMap<ResourceLocation, TriggerType>,
}

impl TriggerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The vanilla triggers plus `milestone:score` and `milestone:dummy`.
    #[must_use]
    pub fn vanilla() -> Self {
        let mut registry = Self::new();
        for path in VANILLA_TRIGGERS {
            let kind = if *path == "impossible" {
                TriggerKind::Impossible
            } else {
                TriggerKind::Standard
            };
            registry.register(TriggerType::new(ResourceLocation::vanilla(*path), kind));
        }
        registry.register(TriggerType::new(score_trigger(), TriggerKind::Score));
        registry.register(TriggerType::new(dummy_trigger(), TriggerKind::Dummy));
        registry
    }

    /// Adds a trigger type, returning the one it replaced.
    pub fn register(&mut self, trigger: TriggerType) -> Option<TriggerType> {
        let previous = self.triggers.insert(trigger.id.clone(), trigger);
        if let Some(previous) = &previous {
            log::debug!("Replaced trigger type {}", previous.id);
        }
        previous
    }

    #[must_use]
    pub fn get(&self, id: &ResourceLocation) -> Option<&TriggerType> {
        self.triggers.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ResourceLocation) -> bool {
        self.triggers.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerType> {
        self.triggers.values()
    }

    /// Decides what the criterion `name` compiles to.
    pub fn classify(
        &self,
        name: &str,
        criterion: &AdvancementCriterion,
    ) -> Result<CriterionKind, CriterionError> {
        let trigger = self
            .get(&criterion.trigger)
            .ok_or_else(|| CriterionError::UnknownTrigger {
                name: name.to_string(),
                trigger: criterion.trigger.clone(),
            })?;
        match trigger.kind {
            TriggerKind::Dummy => Ok(CriterionKind::Dummy),
            TriggerKind::Score => {
                let goal = criterion
                    .conditions
                    .as_ref()
                    .and_then(CriterionConditions::get_score)
                    .ok_or_else(|| CriterionError::MissingScoreGoal(name.to_string()))?;
                if goal > MAX_SCORE_GOAL {
                    return Err(CriterionError::ScoreGoalTooLarge {
                        name: name.to_string(),
                        goal,
                    });
                }
                Ok(CriterionKind::Score { goal })
            }
            TriggerKind::Standard | TriggerKind::Impossible => Ok(CriterionKind::Defaulted {
                trigger: criterion.trigger.clone(),
            }),
        }
    }

    /// Whether the event `context` completes `criterion`.
    #[must_use]
    pub fn matches(&self, criterion: &AdvancementCriterion, context: &TriggerContext) -> bool {
        criterion.trigger == context.trigger
            && self
                .get(&criterion.trigger)
                .is_some_and(|trigger| trigger.matches(criterion, context))
    }
}

/// A game event reported to the advancement system.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub trigger: ResourceLocation,
    pub data: HashMap<String, TriggerValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    ResourceLocation(ResourceLocation),
    StringSet(HashSet<String>),
    ItemStack { item: String, count: i32 },
}

impl TriggerContext {
    #[must_use]
    pub fn new(trigger: ResourceLocation) -> Self {
        Self {
            trigger,
            data: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), TriggerValue::String(value.into()));
        self
    }

    #[must_use]
    pub fn with_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.data.insert(key.into(), TriggerValue::Int(value));
        self
    }

    #[must_use]
    pub fn with_float(mut self, key: impl Into<String>, value: f64) -> Self {
        self.data.insert(key.into(), TriggerValue::Float(value));
        self
    }

    #[must_use]
    pub fn with_resource(mut self, key: impl Into<String>, value: ResourceLocation) -> Self {
        self.data.insert(key.into(), TriggerValue::ResourceLocation(value));
        self
    }

    #[must_use]
    pub fn with_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.data.insert(key.into(), TriggerValue::Bool(value));
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: impl Into<String>, count: i32) -> Self {
        self.data.insert(
            "item".to_string(),
            TriggerValue::ItemStack {
                item: item.into(),
                count,
            },
        );
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let effects = effects.into_iter().map(|e| normalize_id(&e.into())).collect();
        self.data
            .insert("effects".to_string(), TriggerValue::StringSet(effects));
        self
    }

    /// A namespaced id stored under `key`, normalized to `namespace:path`.
    #[must_use]
    pub fn id(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            TriggerValue::String(id) | TriggerValue::ItemStack { item: id, .. } => {
                Some(normalize_id(id))
            }
            TriggerValue::ResourceLocation(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// An integer stored under `key`. `count` also reads the count of the
    /// event's item stack.
    #[must_use]
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.data.get(key) {
            Some(TriggerValue::Int(value)) => Some(*value),
            None if key == "count" => match self.data.get("item")? {
                TriggerValue::ItemStack { count, .. } => Some(i64::from(*count)),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub fn float(&self, key: &str) -> Option<f64> {
        match self.data.get(key)? {
            TriggerValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            TriggerValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }
}

/// Prefixes bare ids with `minecraft:`.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    if id.contains(':') {
        id.to_string()
    } else {
        format!("{MINECRAFT_NAMESPACE}:{id}")
    }
}

/// Compares the common vanilla condition fields against an event.
///
/// A condition whose counterpart is missing from the event passes; tag
/// references (`#namespace:tag`) always pass since tags are not resolved here.
#[must_use]
pub fn default_matcher(conditions: &CriterionConditions, context: &TriggerContext) -> bool {
    conditions
        .get_items()
        .is_none_or(|items| check_items(items, context))
        && conditions
            .get_entity()
            .is_none_or(|entity| check_entity(entity, context))
        && conditions
            .get_block()
            .is_none_or(|block| check_block(block, context))
        && ["from", "to", "recipe_id"].iter().all(|key| {
            conditions.get_str(key).is_none_or(|expected| {
                context
                    .id(key)
                    .is_none_or(|actual| actual == normalize_id(expected))
            })
        })
        && conditions
            .get_min("level")
            .is_none_or(|min| context.int("level").is_none_or(|level| level >= min))
        && conditions
            .get_distance()
            .is_none_or(|distance| check_distance(distance, context))
        && conditions
            .get("effects")
            .is_none_or(|effects| check_effects(effects, context))
}

/// Whether `value` (an id, a tag or a list of ids) names `actual`.
fn id_matches(value: &Value, actual: &str) -> bool {
    match value {
        Value::String(id) if id.starts_with('#') => true,
        Value::String(id) => normalize_id(id) == actual,
        Value::Array(ids) => ids.iter().any(|id| id_matches(id, actual)),
        _ => true,
    }
}

fn check_items(condition: &Value, context: &TriggerContext) -> bool {
    let Some(item) = context.id("item") else {
        return true;
    };
    #[allow(clippy::cast_precision_loss)]
    let count = context.int("count").map(|count| count as f64);
    let item_predicate = |predicate: &Value| match predicate {
        Value::Object(obj) => {
            obj.get("items").is_none_or(|ids| id_matches(ids, &item))
                && obj
                    .get("count")
                    .is_none_or(|range| count.is_none_or(|count| in_range(range, count)))
        }
        other => id_matches(other, &item),
    };
    match condition {
        Value::Array(predicates) => predicates.iter().any(item_predicate),
        predicate => item_predicate(predicate),
    }
}

fn check_entity(condition: &Value, context: &TriggerContext) -> bool {
    let Some(entity) = context.id("entity") else {
        return true;
    };
    let entity_predicate =
        |predicate: &Value| predicate.get("type").is_none_or(|ty| id_matches(ty, &entity));
    match condition {
        // loot-condition form: [{"condition": ..., "predicate": {...}}]
        Value::Array(conditions) => conditions
            .iter()
            .filter_map(|c| c.get("predicate"))
            .any(entity_predicate),
        predicate => entity_predicate(predicate),
    }
}

fn check_block(condition: &Value, context: &TriggerContext) -> bool {
    let Some(block) = context.id("block") else {
        return true;
    };
    match condition {
        Value::Object(obj) => obj.get("blocks").is_none_or(|ids| id_matches(ids, &block)),
        other => id_matches(other, &block),
    }
}

fn in_range(range: &Value, actual: f64) -> bool {
    match range {
        Value::Number(exact) => exact
            .as_f64()
            .is_none_or(|exact| (actual - exact).abs() < f64::EPSILON),
        Value::Object(bounds) => {
            bounds
                .get("min")
                .and_then(Value::as_f64)
                .is_none_or(|min| actual >= min)
                && bounds
                    .get("max")
                    .and_then(Value::as_f64)
                    .is_none_or(|max| actual <= max)
        }
        _ => true,
    }
}

fn check_distance(condition: &Value, context: &TriggerContext) -> bool {
    let horizontal = context.float("distance");
    let vertical = context.float("vertical_distance");
    [
        ("horizontal", horizontal),
        ("absolute", horizontal),
        ("y", vertical),
    ]
    .into_iter()
    .all(|(key, actual)| match (condition.get(key), actual) {
        (Some(range), Some(actual)) => in_range(range, actual),
        _ => true,
    })
}

fn check_effects(condition: &Value, context: &TriggerContext) -> bool {
    let (Some(TriggerValue::StringSet(active)), Some(required)) =
        (context.data.get("effects"), condition.as_object())
    else {
        return true;
    };
    required.keys().all(|effect| active.contains(&normalize_id(effect)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criterion(trigger: &str, conditions: serde_json::Value) -> AdvancementCriterion {
        AdvancementCriterion::with_conditions(
            ResourceLocation::vanilla(trigger),
            CriterionConditions::from_json(conditions),
        )
    }

    #[test]
    fn classify_criteria() {
        let registry = TriggerRegistry::vanilla();
        assert_eq!(
            registry.classify("a", &AdvancementCriterion::score(10)),
            Ok(CriterionKind::Score { goal: 10 })
        );
        assert_eq!(
            registry.classify("b", &AdvancementCriterion::dummy()),
            Ok(CriterionKind::Dummy)
        );
        assert_eq!(
            registry.classify(
                "c",
                &AdvancementCriterion::new(ResourceLocation::vanilla("impossible"))
            ),
            Ok(CriterionKind::Defaulted {
                trigger: ResourceLocation::vanilla("impossible")
            })
        );
    }

    #[test]
    fn classify_errors() {
        let registry = TriggerRegistry::vanilla();
        assert_eq!(
            registry.classify("goal", &AdvancementCriterion::new(score_trigger())),
            Err(CriterionError::MissingScoreGoal("goal".to_string()))
        );
        assert_eq!(
            registry.classify("huge", &AdvancementCriterion::score(i32::MAX)),
            Err(CriterionError::ScoreGoalTooLarge {
                name: "huge".to_string(),
                goal: i32::MAX,
            })
        );
        assert_eq!(
            registry.classify("edge", &AdvancementCriterion::score(MAX_SCORE_GOAL)),
            Ok(CriterionKind::Score {
                goal: MAX_SCORE_GOAL
            })
        );
        assert!(matches!(
            registry.classify(
                "x",
                &AdvancementCriterion::new(ResourceLocation::new("mod", "custom"))
            ),
            Err(CriterionError::UnknownTrigger { .. })
        ));
        assert!(matches!(
            TriggerRegistry::new().classify("d", &AdvancementCriterion::dummy()),
            Err(CriterionError::UnknownTrigger { .. })
        ));
    }

    #[test]
    fn items_match_with_or_without_namespace() {
        let registry = TriggerRegistry::vanilla();
        let got_dirt = criterion("inventory_changed", json!({"items": [{"items": "dirt"}]}));
        let event = TriggerContext::new(ResourceLocation::vanilla("inventory_changed"));

        assert!(registry.matches(&got_dirt, &event.clone().with_item("minecraft:dirt", 1)));
        assert!(!registry.matches(&got_dirt, &event.clone().with_item("stone", 1)));
        // missing event data passes
        assert!(registry.matches(&got_dirt, &event));
    }

    #[test]
    fn item_count_range() {
        let stack = CriterionConditions::from_json(
            json!({"items": [{"items": "minecraft:dirt", "count": {"min": 64}}]}),
        );
        let event = TriggerContext::new(ResourceLocation::vanilla("inventory_changed"));
        assert!(default_matcher(&stack, &event.clone().with_item("dirt", 64)));
        assert!(!default_matcher(&stack, &event.with_item("dirt", 63)));
    }

    #[test]
    fn trigger_id_must_match() {
        let registry = TriggerRegistry::vanilla();
        let any_tick = AdvancementCriterion::new(ResourceLocation::vanilla("tick"));
        assert!(registry.matches(
            &any_tick,
            &TriggerContext::new(ResourceLocation::vanilla("tick"))
        ));
        assert!(!registry.matches(
            &any_tick,
            &TriggerContext::new(ResourceLocation::vanilla("location"))
        ));
    }

    #[test]
    fn impossible_and_score_never_match_events() {
        let registry = TriggerRegistry::vanilla();
        let impossible = AdvancementCriterion::new(ResourceLocation::vanilla("impossible"));
        assert!(!registry.matches(
            &impossible,
            &TriggerContext::new(ResourceLocation::vanilla("impossible"))
        ));
        assert!(!registry.matches(
            &AdvancementCriterion::score(1),
            &TriggerContext::new(score_trigger())
        ));
    }

    #[test]
    fn entity_block_and_dimension_conditions() {
        let kill = criterion(
            "player_killed_entity",
            json!({"entity": [{"condition": "minecraft:entity_properties", "predicate": {"type": "minecraft:zombie"}}]}),
        );
        let event = TriggerContext::new(ResourceLocation::vanilla("player_killed_entity"));
        assert!(default_matcher(
            kill.conditions.as_ref().unwrap(),
            &event.clone().with_string("entity", "zombie")
        ));
        assert!(!default_matcher(
            kill.conditions.as_ref().unwrap(),
            &event.with_string("entity", "skeleton")
        ));

        let water = CriterionConditions::from_json(json!({"block": "minecraft:water"}));
        let event = TriggerContext::new(ResourceLocation::vanilla("enter_block"));
        assert!(default_matcher(&water, &event.clone().with_string("block", "water")));
        assert!(!default_matcher(&water, &event.with_string("block", "lava")));

        let nether = CriterionConditions::from_json(json!({"to": "minecraft:the_nether"}));
        let event = TriggerContext::new(ResourceLocation::vanilla("changed_dimension"));
        assert!(default_matcher(
            &nether,
            &event
                .clone()
                .with_resource("to", ResourceLocation::vanilla("the_nether"))
        ));
        assert!(!default_matcher(
            &nether,
            &event.with_resource("to", ResourceLocation::vanilla("the_end"))
        ));
    }

    #[test]
    fn numeric_conditions() {
        let beacon = CriterionConditions::from_json(json!({"level": {"min": 4}}));
        let event = TriggerContext::new(ResourceLocation::vanilla("construct_beacon"));
        assert!(default_matcher(&beacon, &event.clone().with_int("level", 4)));
        assert!(!default_matcher(&beacon, &event.with_int("level", 3)));

        let travel = CriterionConditions::from_json(
            json!({"distance": {"horizontal": {"min": 7000.0}}}),
        );
        let event = TriggerContext::new(ResourceLocation::vanilla("nether_travel"));
        assert!(default_matcher(&travel, &event.clone().with_float("distance", 7000.5)));
        assert!(!default_matcher(&travel, &event.with_float("distance", 10.0)));
    }

    #[test]
    fn effects_must_all_be_active() {
        let conditions = CriterionConditions::from_json(
            json!({"effects": {"minecraft:speed": {}, "strength": {}}}),
        );
        let event = TriggerContext::new(ResourceLocation::vanilla("effects_changed"));
        assert!(default_matcher(
            &conditions,
            &event.clone().with_effects(["speed", "minecraft:strength", "haste"])
        ));
        assert!(!default_matcher(&conditions, &event.with_effects(["speed"])));
    }

    #[test]
    fn custom_matcher() {
        let id = ResourceLocation::new("mod", "jump");
        let mut registry = TriggerRegistry::new();
        assert!(
            registry
                .register(
                    TriggerType::new(id.clone(), TriggerKind::Standard).with_matcher(
                        |conditions, context| conditions.get_min("height").is_none_or(|min| {
                            context.int("height").is_some_and(|height| height >= min)
                        })
                    )
                )
                .is_none()
        );

        let high_jump = AdvancementCriterion::with_conditions(
            id.clone(),
            CriterionConditions::from_json(json!({"height": 5})),
        );
        let event = TriggerContext::new(id.clone());
        assert!(registry.matches(&high_jump, &event.clone().with_int("height", 6)));
        assert!(!registry.matches(&high_jump, &event));
        assert!(
            registry
                .register(TriggerType::new(id, TriggerKind::Standard))
                .is_some()
        );
    }
}
