use milestone_util::resource_location::ResourceLocation;
use milestone_util::text::TextComponent;

use super::AdvancementRegistry;

/// Something that changed in a player's advancement progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvancementEvent {
    CriterionGranted {
        player: String,
        advancement: ResourceLocation,
        criterion: String,
    },
    CriterionRevoked {
        player: String,
        advancement: ResourceLocation,
        criterion: String,
    },
    ScoreChanged {
        player: String,
        advancement: ResourceLocation,
        criterion: String,
        old: u32,
        new: u32,
        goal: u32,
    },
    /// The advancement went from incomplete to complete.
    Achieved {
        player: String,
        advancement: ResourceLocation,
    },
    /// The advancement went from complete to incomplete.
    Revoked {
        player: String,
        advancement: ResourceLocation,
    },
}

impl AdvancementEvent {
    #[must_use]
    pub fn player(&self) -> &str {
        match self {
            Self::CriterionGranted { player, .. }
            | Self::CriterionRevoked { player, .. }
            | Self::ScoreChanged { player, .. }
            | Self::Achieved { player, .. }
            | Self::Revoked { player, .. } => player,
        }
    }

    #[must_use]
    pub fn advancement(&self) -> &ResourceLocation {
        match self {
            Self::CriterionGranted { advancement, .. }
            | Self::CriterionRevoked { advancement, .. }
            | Self::ScoreChanged { advancement, .. }
            | Self::Achieved { advancement, .. }
            | Self::Revoked { advancement, .. } => advancement,
        }
    }
}

/// Receives every event produced by the server, in order.
pub trait AdvancementListener: Send {
    fn on_event(&mut self, event: &AdvancementEvent, registry: &AdvancementRegistry);
}

/// Logs completed advancements the way a client would show them: the chat
/// announcement, the toast and the rewards handed out.
#[derive(Debug, Default)]
pub struct AnnounceListener;

impl AnnounceListener {
    /// The chat line for an achieved advancement, if its display asks for one.
    #[must_use]
    pub fn chat_message(
        event: &AdvancementEvent,
        registry: &AdvancementRegistry,
    ) -> Option<TextComponent> {
        let AdvancementEvent::Achieved {
            player,
            advancement,
        } = event
        else {
            return None;
        };
        let display = registry
            .get(advancement)?
            .entry
            .advancement
            .display
            .as_ref()?;
        if !display.announce_to_chat {
            return None;
        }
        Some(TextComponent::translate(
            display.frame.chat_key(),
            [TextComponent::text(player.clone()), display.title.clone()],
        ))
    }
}

impl AdvancementListener for AnnounceListener {
    fn on_event(&mut self, event: &AdvancementEvent, registry: &AdvancementRegistry) {
        let AdvancementEvent::Achieved {
            player,
            advancement,
        } = event
        else {
            return;
        };
        let Some(placed) = registry.get(advancement) else {
            return;
        };

        if let Some(message) = Self::chat_message(event, registry) {
            log::info!("[chat] {message}");
        }
        if placed
            .entry
            .advancement
            .display
            .as_ref()
            .is_some_and(|display| display.show_toast)
        {
            let [header, title] = placed.entry.toast_text();
            log::info!("[toast:{player}] {header}: {title}");
        }

        let rewards = &placed.entry.advancement.rewards;
        if !rewards.is_empty() {
            log::info!(
                "Rewarding {player} for {advancement}: {} experience, {} recipe(s), {} loot table(s)",
                rewards.experience,
                rewards.recipes.len(),
                rewards.loot.len()
            );
            if let Some(function) = &rewards.function {
                log::debug!("Reward function {function} is not run outside a game server");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advancement::registry::tests::{counting_registry, id};

    #[test]
    fn achieved_advancements_are_announced() {
        let registry = counting_registry();
        let event = AdvancementEvent::Achieved {
            player: "Steve".to_string(),
            advancement: id("counting"),
        };
        let message = AnnounceListener::chat_message(&event, &registry).unwrap();
        assert_eq!(
            message.to_plain(),
            "chat.type.advancement.task(Steve, Counting)"
        );
    }

    #[test]
    fn other_events_are_not_announced() {
        let registry = counting_registry();
        let event = AdvancementEvent::CriterionGranted {
            player: "Steve".to_string(),
            advancement: id("counting"),
            criterion: "bypass".to_string(),
        };
        assert!(AnnounceListener::chat_message(&event, &registry).is_none());
        assert_eq!(event.player(), "Steve");
        assert_eq!(event.advancement(), &id("counting"));
    }
}
