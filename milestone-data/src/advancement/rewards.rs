use milestone_util::resource_location::ResourceLocation;
use serde::{Deserialize, Serialize};

/// Rewards handed out by the host when an advancement is completed.
///
/// Missing and `null` rewards both deserialize to [`AdvancementRewards::empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancementRewards {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub experience: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipes: Vec<ResourceLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loot: Vec<ResourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ResourceLocation>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

impl AdvancementRewards {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            experience: 0,
            recipes: Vec::new(),
            loot: Vec::new(),
            function: None,
        }
    }

    #[must_use]
    pub const fn with_experience(experience: i32) -> Self {
        Self {
            experience,
            recipes: Vec::new(),
            loot: Vec::new(),
            function: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experience == 0
            && self.recipes.is_empty()
            && self.loot.is_empty()
            && self.function.is_none()
    }
}
