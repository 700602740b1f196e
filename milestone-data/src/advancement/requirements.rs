use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Defines the requirements for completing an advancement.
///
/// Requirements are a list of lists (AND of ORs). Each inner list is a group
/// of criterion names of which at least one must be completed; every group
/// must be completed for the advancement to be done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdvancementRequirements {
    pub requirements: Vec<Vec<String>>,
}

impl AdvancementRequirements {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            requirements: Vec::new(),
        }
    }

    #[must_use]
    pub fn new(requirements: Vec<Vec<String>>) -> Self {
        Self { requirements }
    }

    /// Requirements where ALL criteria must be completed, one group per
    /// criterion in sorted order.
    #[must_use]
    pub fn all_of(criteria: impl IntoIterator<Item = String>) -> Self {
        let sorted: BTreeSet<String> = criteria.into_iter().collect();
        Self {
            requirements: sorted.into_iter().map(|c| vec![c]).collect(),
        }
    }

    /// Requirements where ANY ONE criterion must be completed.
    #[must_use]
    pub fn any_of(criteria: impl IntoIterator<Item = String>) -> Self {
        let criteria: Vec<String> = criteria.into_iter().collect();
        if criteria.is_empty() {
            Self::empty()
        } else {
            Self {
                requirements: vec![criteria],
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Number of requirement groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn groups(&self) -> impl Iterator<Item = &[String]> {
        self.requirements.iter().map(Vec::as_slice)
    }

    /// All unique criterion names referenced in these requirements.
    #[must_use]
    pub fn get_names(&self) -> BTreeSet<String> {
        self.requirements.iter().flatten().cloned().collect()
    }
}

impl From<Vec<Vec<String>>> for AdvancementRequirements {
    fn from(requirements: Vec<Vec<String>>) -> Self {
        Self::new(requirements)
    }
}
