use milestone_util::resource_location::ResourceLocation;
use milestone_util::text::TextComponent;
use serde::{Deserialize, Serialize};

use super::AdvancementFrame;

/// Display information for an advancement shown in the advancement screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementDisplay {
    pub icon: AdvancementIcon,
    pub title: TextComponent,
    pub description: TextComponent,
    #[serde(default)]
    pub frame: AdvancementFrame,
    /// Background texture, only meaningful on root advancements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<ResourceLocation>,
    #[serde(default = "default_true")]
    pub show_toast: bool,
    #[serde(default = "default_true")]
    pub announce_to_chat: bool,
    /// Hidden advancements stay invisible until they are completed.
    #[serde(default)]
    pub hidden: bool,
    /// Column in the advancement tab, assigned by the registry layout.
    #[serde(skip)]
    pub x: f32,
    /// Row in the advancement tab, assigned by the registry layout.
    #[serde(skip)]
    pub y: f32,
}

fn default_true() -> bool {
    true
}

impl AdvancementDisplay {
    /// Creates a task display that toasts and announces, with no background.
    #[must_use]
    pub fn new(icon: AdvancementIcon, title: TextComponent, description: TextComponent) -> Self {
        Self {
            icon,
            title,
            description,
            frame: AdvancementFrame::Task,
            background: None,
            show_toast: true,
            announce_to_chat: true,
            hidden: false,
            x: 0.0,
            y: 0.0,
        }
    }

    #[must_use]
    pub fn frame(mut self, frame: AdvancementFrame) -> Self {
        self.frame = frame;
        self
    }

    #[must_use]
    pub fn background(mut self, background: ResourceLocation) -> Self {
        self.background = Some(background);
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn set_pos(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }
}

/// The icon displayed for an advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementIcon {
    #[serde(rename = "id")]
    pub item: ResourceLocation,
    #[serde(default = "default_count", skip_serializing_if = "is_default_count")]
    pub count: i32,
    /// Item components, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<serde_json::Value>,
}

fn default_count() -> i32 {
    1
}

fn is_default_count(count: &i32) -> bool {
    *count == 1
}

impl AdvancementIcon {
    #[must_use]
    pub fn simple(item: ResourceLocation) -> Self {
        Self {
            item,
            count: 1,
            components: None,
        }
    }
}
