use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::progress::current_time_millis;
use super::{
    AdvancementRequirements, CriteriaMap, CriterionKind, CriterionProgress, ProgressStore,
    MAX_SCORE_GOAL, SCORE_GOAL_SUFFIX, ScoreExpansion, TriggerRegistry,
    expand_score_criterion, parse_score_unit_name,
};
use crate::CriterionError;

/// A node of the boolean expression an advancement's criteria compile to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionNode {
    /// Always satisfied.
    Dummy,
    /// A named boolean criterion, looked up in the progress store.
    Leaf(String),
    /// A score criterion by name, satisfied when all of its units are
    /// obtained. The units live in the tree's score table.
    Score(String),
    And(Vec<CriterionNode>),
    Or(Vec<CriterionNode>),
}

impl CriterionNode {
    /// Evaluates this node against stored progress. Names missing from the
    /// store count as not obtained, as do scores missing from `scores`.
    #[must_use]
    pub fn is_satisfied<S: ProgressStore + ?Sized>(
        &self,
        store: &S,
        scores: &HashMap<String, ScoreExpansion>,
    ) -> bool {
        match self {
            Self::Dummy => true,
            Self::Leaf(name) => store.is_obtained(name),
            Self::Score(name) => scores
                .get(name)
                .is_some_and(|score| score.is_satisfied(store)),
            Self::And(children) => children
                .iter()
                .all(|child| child.is_satisfied(store, scores)),
            Self::Or(children) => children
                .iter()
                .any(|child| child.is_satisfied(store, scores)),
        }
    }
}

/// The compiled criteria of one advancement.
///
/// Built once at registration from the definition's criteria and requirement
/// groups: each group becomes an `Or` over its criteria and the groups are
/// joined by an `And`. The definition itself is never modified; the
/// score-expanded requirements in vanilla form are kept alongside the tree.
///
/// Mutations only touch the named entry. Callers re-evaluate the tree
/// afterwards to learn whether the advancement is done.
#[derive(Debug, Clone)]
pub struct CriterionTree {
    root: CriterionNode,
    kinds: BTreeMap<String, CriterionKind>,
    scores: HashMap<String, ScoreExpansion>,
    requirements: AdvancementRequirements,
}

impl CriterionTree {
    /// Classifies every criterion through `triggers`, then compiles the
    /// requirement groups.
    pub fn build(
        requirements: &AdvancementRequirements,
        criteria: &CriteriaMap,
        triggers: &TriggerRegistry,
    ) -> Result<Self, CriterionError> {
        let mut kinds = HashMap::with_capacity(criteria.len());
        for (name, criterion) in criteria {
            kinds.insert(name.clone(), triggers.classify(name, criterion)?);
        }
        Self::from_kinds(requirements, &kinds)
    }

    /// Compiles requirement groups over already classified criteria.
    /// Fails when a group names a criterion missing from `kinds` or a score
    /// goal exceeds [`MAX_SCORE_GOAL`].
    pub fn from_kinds(
        requirements: &AdvancementRequirements,
        kinds: &HashMap<String, CriterionKind>,
    ) -> Result<Self, CriterionError> {
        if let Some(name) = kinds.keys().find(|name| name.contains(SCORE_GOAL_SUFFIX)) {
            return Err(CriterionError::ReservedName(name.clone()));
        }

        let mut scores = HashMap::new();
        for (name, kind) in kinds {
            if let CriterionKind::Score { goal } = kind {
                if *goal > MAX_SCORE_GOAL {
                    return Err(CriterionError::ScoreGoalTooLarge {
                        name: name.clone(),
                        goal: *goal,
                    });
                }
                scores.insert(name.clone(), expand_score_criterion(name, *goal));
            }
        }

        let mut groups = Vec::with_capacity(requirements.len());
        for group in requirements.groups() {
            let mut alternatives = Vec::with_capacity(group.len());
            for name in group {
                let node = match kinds.get(name) {
                    None => return Err(CriterionError::UnknownCriterion(name.clone())),
                    Some(CriterionKind::Dummy) => CriterionNode::Dummy,
                    Some(CriterionKind::Score { .. }) => CriterionNode::Score(name.clone()),
                    Some(CriterionKind::Defaulted { .. }) => CriterionNode::Leaf(name.clone()),
                };
                alternatives.push(node);
            }
            groups.push(CriterionNode::Or(alternatives));
        }

        let requirements = flatten_requirements(requirements, kinds, &scores);
        Ok(Self {
            root: CriterionNode::And(groups),
            kinds: kinds.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            scores,
            requirements,
        })
    }

    #[must_use]
    pub const fn root(&self) -> &CriterionNode {
        &self.root
    }

    /// Requirement groups in vanilla form, with score criteria replaced by
    /// their units and dummy-satisfied groups removed.
    #[must_use]
    pub const fn requirements(&self) -> &AdvancementRequirements {
        &self.requirements
    }

    #[must_use]
    pub fn is_satisfied<S: ProgressStore + ?Sized>(&self, store: &S) -> bool {
        self.root.is_satisfied(store, &self.scores)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<&CriterionKind> {
        self.kinds.get(name)
    }

    /// Criterion names as written in the definition, sorted.
    pub fn criterion_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    #[must_use]
    pub fn score_expansion(&self, name: &str) -> Option<&ScoreExpansion> {
        self.scores.get(name)
    }

    /// Every name this tree reads from a progress store: boolean criteria
    /// and score units. Dummy criteria store nothing.
    #[must_use]
    pub fn stored_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for (name, kind) in &self.kinds {
            match kind {
                CriterionKind::Dummy => {}
                CriterionKind::Defaulted { .. } => {
                    names.insert(name.clone());
                }
                CriterionKind::Score { .. } => {
                    if let Some(score) = self.scores.get(name) {
                        names.extend(score.units().iter().cloned());
                    }
                }
            }
        }
        names
    }

    /// The stored names behind a definition criterion name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Vec<&str> {
        match self.kinds.get_key_value(name) {
            Some((key, CriterionKind::Defaulted { .. })) => vec![key.as_str()],
            Some((_, CriterionKind::Score { .. })) => self
                .scores
                .get(name)
                .map(|score| score.units().iter().map(String::as_str).collect())
                .unwrap_or_default(),
            Some((_, CriterionKind::Dummy)) | None => Vec::new(),
        }
    }

    /// The definition criterion a stored name belongs to.
    #[must_use]
    pub fn owner_of(&self, stored: &str) -> Option<&str> {
        if let Some((key, CriterionKind::Defaulted { .. })) = self.kinds.get_key_value(stored) {
            return Some(key.as_str());
        }
        let (name, _) = parse_score_unit_name(stored)?;
        self.scores
            .get_key_value(name)
            .filter(|(_, score)| score.contains_unit(stored))
            .map(|(key, _)| key.as_str())
    }

    /// Whether a single definition criterion is complete.
    #[must_use]
    pub fn is_criterion_done<S: ProgressStore + ?Sized>(&self, store: &S, name: &str) -> bool {
        match self.kinds.get(name) {
            Some(CriterionKind::Dummy) => true,
            Some(CriterionKind::Defaulted { .. }) => store.is_obtained(name),
            Some(CriterionKind::Score { .. }) => self
                .scores
                .get(name)
                .is_some_and(|score| score.is_satisfied(store)),
            None => false,
        }
    }

    /// Grants a criterion; a score criterion is filled up to its goal.
    /// Also accepts a single score unit name. Returns whether anything
    /// changed; granting twice is a no-op.
    pub fn grant<S: ProgressStore + ?Sized>(&self, store: &mut S, name: &str) -> bool {
        match self.kinds.get(name) {
            Some(CriterionKind::Defaulted { .. }) => obtain(store, name),
            Some(CriterionKind::Score { .. }) => self
                .scores
                .get(name)
                .is_some_and(|score| score.set(store, score.goal())),
            Some(CriterionKind::Dummy) => false,
            None => match self.owner_of(name) {
                Some(_) => obtain(store, name),
                None => {
                    log::warn!("Tried to grant unknown criterion `{name}`");
                    false
                }
            },
        }
    }

    /// Revokes a criterion; a score criterion drops back to zero. Returns
    /// whether anything changed.
    pub fn revoke<S: ProgressStore + ?Sized>(&self, store: &mut S, name: &str) -> bool {
        match self.kinds.get(name) {
            Some(CriterionKind::Defaulted { .. }) => reset(store, name),
            Some(CriterionKind::Score { .. }) => self
                .scores
                .get(name)
                .is_some_and(|score| score.set(store, 0)),
            Some(CriterionKind::Dummy) => false,
            None => match self.owner_of(name) {
                Some(_) => reset(store, name),
                None => {
                    log::warn!("Tried to revoke unknown criterion `{name}`");
                    false
                }
            },
        }
    }

    /// Adds `delta` to a criterion's counter and returns the new value.
    ///
    /// Score criteria saturate at `0..=goal`. A boolean criterion counts as
    /// 0 or 1: positive deltas grant it and negative deltas revoke it.
    /// Dummy and unknown criteria have no counter and yield `None`.
    pub fn add<S: ProgressStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        delta: i32,
    ) -> Option<u32> {
        match self.kinds.get(name) {
            Some(CriterionKind::Score { .. }) => {
                self.scores.get(name).map(|score| score.add(store, delta))
            }
            Some(CriterionKind::Defaulted { .. }) => {
                if delta > 0 {
                    obtain(store, name);
                } else if delta < 0 {
                    reset(store, name);
                }
                Some(u32::from(store.is_obtained(name)))
            }
            Some(CriterionKind::Dummy) => None,
            None => {
                log::warn!("Tried to add {delta} to unknown criterion `{name}`");
                None
            }
        }
    }

    /// Sets a score criterion's counter. Returns whether anything changed.
    pub fn set_score<S: ProgressStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        score: u32,
    ) -> bool {
        if let Some(expansion) = self.scores.get(name) {
            expansion.set(store, score)
        } else {
            log::warn!("Tried to set the score of `{name}`, which is not a score criterion");
            false
        }
    }

    /// Current counter of a criterion: the score for score criteria, 0 or 1
    /// for boolean ones.
    #[must_use]
    pub fn score<S: ProgressStore + ?Sized>(&self, store: &S, name: &str) -> Option<u32> {
        match self.kinds.get(name)? {
            CriterionKind::Score { .. } => self.scores.get(name).map(|score| score.score(store)),
            CriterionKind::Defaulted { .. } => Some(u32::from(store.is_obtained(name))),
            CriterionKind::Dummy => None,
        }
    }

    /// Number of top-level requirement groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        match &self.root {
            CriterionNode::And(groups) => groups.len(),
            _ => 1,
        }
    }

    #[must_use]
    pub fn satisfied_groups<S: ProgressStore + ?Sized>(&self, store: &S) -> usize {
        match &self.root {
            CriterionNode::And(groups) => groups
                .iter()
                .filter(|g| g.is_satisfied(store, &self.scores))
                .count(),
            node => usize::from(node.is_satisfied(store, &self.scores)),
        }
    }

    /// Completion ratio between 0.0 and 1.0 over the top-level groups.
    #[must_use]
    pub fn percent<S: ProgressStore + ?Sized>(&self, store: &S) -> f32 {
        let total = self.group_count();
        if total == 0 {
            return 1.0;
        }
        self.satisfied_groups(store) as f32 / total as f32
    }
}

fn obtain<S: ProgressStore + ?Sized>(store: &mut S, name: &str) -> bool {
    if store.is_obtained(name) {
        return false;
    }
    store.set(name, CriterionProgress::obtained_at(current_time_millis()));
    true
}

fn reset<S: ProgressStore + ?Sized>(store: &mut S, name: &str) -> bool {
    if !store.is_obtained(name) {
        return false;
    }
    store.set(name, CriterionProgress::new());
    true
}

/// Rewrites requirement groups so score criteria appear as their units.
///
/// An AND of units cannot stay an alternative inside an OR group, so a group
/// holding a score criterion is split into one group per unit and one per
/// sibling. This form is stricter than the tree and is only used where
/// vanilla-shaped requirements are needed; the tree stays authoritative.
fn flatten_requirements(
    requirements: &AdvancementRequirements,
    kinds: &HashMap<String, CriterionKind>,
    scores: &HashMap<String, ScoreExpansion>,
) -> AdvancementRequirements {
    let mut flattened = Vec::with_capacity(requirements.len());
    for group in requirements.groups() {
        if group
            .iter()
            .any(|name| matches!(kinds.get(name), Some(CriterionKind::Dummy)))
        {
            continue;
        }
        if !group.iter().any(|name| scores.contains_key(name)) {
            flattened.push(group.to_vec());
            continue;
        }
        for name in group {
            match scores.get(name) {
                Some(score) => {
                    flattened.extend(score.units().iter().map(|unit| vec![unit.clone()]));
                }
                None => flattened.push(vec![name.clone()]),
            }
        }
    }
    AdvancementRequirements::new(flattened)
}
