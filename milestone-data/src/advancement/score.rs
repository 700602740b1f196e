use super::progress::current_time_millis;
use super::{CriterionProgress, ProgressStore};

/// Separator between a score criterion's name and the index of one of its
/// units.
pub const SCORE_GOAL_SUFFIX: &str = "&score_goal_id=";

/// Largest goal a score criterion may declare. Every unit is stored per
/// player, so definitions above this are rejected when compiled.
pub const MAX_SCORE_GOAL: i32 = 10_000;

/// A score criterion split into `goal` unit criteria joined by AND.
///
/// The score is the number of obtained units, so a counter can be stored in
/// the same per-name progress format as any other criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreExpansion {
    name: String,
    goal: u32,
    units: Vec<String>,
}

/// Expands the score criterion `name` into its unit criteria. A goal of zero
/// or less yields no units, which makes the criterion trivially satisfied.
/// Goals above [`MAX_SCORE_GOAL`] are clamped to it.
#[must_use]
pub fn expand_score_criterion(name: &str, goal: i32) -> ScoreExpansion {
    let goal = u32::try_from(goal.min(MAX_SCORE_GOAL)).unwrap_or(0);
    ScoreExpansion {
        name: name.to_string(),
        goal,
        units: (0..goal).map(|index| score_unit_name(name, index)).collect(),
    }
}

#[must_use]
pub fn score_unit_name(name: &str, index: u32) -> String {
    format!("{name}{SCORE_GOAL_SUFFIX}{index}")
}

/// Splits a unit name back into the score criterion name and the unit index.
#[must_use]
pub fn parse_score_unit_name(unit: &str) -> Option<(&str, u32)> {
    let (name, index) = unit.rsplit_once(SCORE_GOAL_SUFFIX)?;
    Some((name, index.parse().ok()?))
}

impl ScoreExpansion {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn goal(&self) -> u32 {
        self.goal
    }

    #[must_use]
    pub fn units(&self) -> &[String] {
        &self.units
    }

    #[must_use]
    pub fn contains_unit(&self, unit: &str) -> bool {
        parse_score_unit_name(unit)
            .is_some_and(|(name, index)| name == self.name && index < self.goal)
    }

    #[must_use]
    pub fn score<S: ProgressStore + ?Sized>(&self, store: &S) -> u32 {
        let obtained = self.units.iter().filter(|unit| store.is_obtained(unit)).count();
        u32::try_from(obtained).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn is_satisfied<S: ProgressStore + ?Sized>(&self, store: &S) -> bool {
        self.units.iter().all(|unit| store.is_obtained(unit))
    }

    /// Moves the score by `delta` and returns the new score. Positive deltas
    /// obtain the lowest missing units, negative deltas reset the highest
    /// obtained ones; both saturate at the bounds.
    pub fn add<S: ProgressStore + ?Sized>(&self, store: &mut S, delta: i32) -> u32 {
        let mut remaining = delta.unsigned_abs();
        if delta > 0 {
            let now = current_time_millis();
            for unit in &self.units {
                if remaining == 0 {
                    break;
                }
                if !store.is_obtained(unit) {
                    store.set(unit, CriterionProgress::obtained_at(now));
                    remaining -= 1;
                }
            }
        } else {
            for unit in self.units.iter().rev() {
                if remaining == 0 {
                    break;
                }
                if store.is_obtained(unit) {
                    store.set(unit, CriterionProgress::new());
                    remaining -= 1;
                }
            }
        }
        self.score(store)
    }

    /// Sets the score, clamped to `0..=goal`, and returns whether any unit
    /// changed.
    pub fn set<S: ProgressStore + ?Sized>(&self, store: &mut S, score: u32) -> bool {
        let score = score.min(self.goal) as usize;
        let now = current_time_millis();
        let mut changed = false;
        for (index, unit) in self.units.iter().enumerate() {
            let obtained = store.is_obtained(unit);
            if index < score && !obtained {
                store.set(unit, CriterionProgress::obtained_at(now));
                changed = true;
            } else if index >= score && obtained {
                store.set(unit, CriterionProgress::new());
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn expansion_is_deterministic_and_reversible() {
        let expansion = expand_score_criterion("counter", 3);
        assert_eq!(
            expansion.units(),
            [
                "counter&score_goal_id=0",
                "counter&score_goal_id=1",
                "counter&score_goal_id=2"
            ]
        );
        assert_eq!(expansion, expand_score_criterion("counter", 3));
        for unit in expansion.units() {
            assert_eq!(parse_score_unit_name(unit).map(|(name, _)| name), Some("counter"));
            assert!(expansion.contains_unit(unit));
        }
        assert!(!expansion.contains_unit("counter&score_goal_id=3"));
        assert_eq!(parse_score_unit_name("counter"), None);
    }

    #[test]
    fn non_positive_goal_is_satisfied() {
        let store: HashMap<String, CriterionProgress> = HashMap::new();
        for goal in [0, -5] {
            let expansion = expand_score_criterion("free", goal);
            assert_eq!(expansion.goal(), 0);
            assert!(expansion.units().is_empty());
            assert!(expansion.is_satisfied(&store));
        }
    }

    #[test]
    fn oversized_goal_is_clamped() {
        let expansion = expand_score_criterion("huge", i32::MAX);
        assert_eq!(expansion.goal(), MAX_SCORE_GOAL as u32);
        assert_eq!(expansion.units().len(), MAX_SCORE_GOAL as usize);
    }

    #[test]
    fn goal_of_ten() {
        let expansion = expand_score_criterion("counter", 10);
        let mut store: HashMap<String, CriterionProgress> = HashMap::new();

        for _ in 0..9 {
            expansion.add(&mut store, 1);
        }
        assert_eq!(expansion.score(&store), 9);
        assert!(!expansion.is_satisfied(&store));

        assert_eq!(expansion.add(&mut store, 1), 10);
        assert!(expansion.is_satisfied(&store));

        assert_eq!(expansion.add(&mut store, 1), 10);
        assert!(expansion.is_satisfied(&store));
    }

    #[test]
    fn negative_add_and_set_clamp() {
        let expansion = expand_score_criterion("counter", 4);
        let mut store: HashMap<String, CriterionProgress> = HashMap::new();

        assert!(expansion.set(&mut store, 99));
        assert_eq!(expansion.score(&store), 4);
        assert!(!expansion.set(&mut store, 4));

        assert_eq!(expansion.add(&mut store, -3), 1);
        assert!(store.is_obtained("counter&score_goal_id=0"));
        assert!(!store.is_obtained("counter&score_goal_id=1"));
        assert_eq!(expansion.add(&mut store, -3), 0);
    }
}
