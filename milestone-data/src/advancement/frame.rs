use serde::{Deserialize, Serialize};

/// The frame type of an advancement, which determines how completion is
/// announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancementFrame {
    #[default]
    Task,
    Goal,
    Challenge,
}

impl AdvancementFrame {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Goal => "goal",
            Self::Challenge => "challenge",
        }
    }

    /// Unknown or missing frame names fall back to [`AdvancementFrame::Task`].
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("goal") => Self::Goal,
            Some("challenge") => Self::Challenge,
            _ => Self::Task,
        }
    }

    /// Translation key of the toast header, e.g. `advancements.toast.goal`.
    #[must_use]
    pub fn toast_key(self) -> String {
        format!("advancements.toast.{}", self.as_str())
    }

    /// Translation key of the chat announcement.
    #[must_use]
    pub fn chat_key(self) -> String {
        format!("chat.type.advancement.{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_frames_are_tasks() {
        assert_eq!(AdvancementFrame::from_name(Some("goal")), AdvancementFrame::Goal);
        assert_eq!(AdvancementFrame::from_name(Some("bogus")), AdvancementFrame::Task);
        assert_eq!(AdvancementFrame::from_name(None), AdvancementFrame::Task);
    }

    #[test]
    fn translation_keys() {
        assert_eq!(
            AdvancementFrame::Challenge.toast_key(),
            "advancements.toast.challenge"
        );
        assert_eq!(AdvancementFrame::Task.chat_key(), "chat.type.advancement.task");
    }
}
