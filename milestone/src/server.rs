use std::collections::HashMap;
use std::path::PathBuf;

use milestone_data::advancement::{TriggerContext, TriggerRegistry};

use crate::advancement::{
    AdvancementEvent, AdvancementListener, AdvancementRegistry, AdvancementTriggers,
    AnnounceListener, PlayerAdvancementTracker,
};
use crate::config::MilestoneConfig;
use crate::error::StorageError;
use crate::storage::PlayerProgressStorage;

/// Hosts the advancement registry and the progress of every player seen so
/// far. Players are loaded from storage on first use and kept in memory.
pub struct AdvancementServer {
    pub config: MilestoneConfig,
    pub registry: AdvancementRegistry,
    storage: PlayerProgressStorage,
    players: HashMap<String, PlayerAdvancementTracker>,
    listeners: Vec<Box<dyn AdvancementListener>>,
}

impl AdvancementServer {
    /// Creates a server with the vanilla trigger registry. The announcing
    /// listener is installed when the config enables it.
    #[must_use]
    pub fn new(config: MilestoneConfig) -> Self {
        let storage = PlayerProgressStorage::new(config.player_data.clone());
        let mut server = Self {
            registry: AdvancementRegistry::new(TriggerRegistry::vanilla()),
            storage,
            players: HashMap::new(),
            listeners: Vec::new(),
            config,
        };
        if server.config.announce_advancements {
            server.add_listener(Box::new(AnnounceListener));
        }
        server
    }

    pub fn add_listener(&mut self, listener: Box<dyn AdvancementListener>) {
        self.listeners.push(listener);
    }

    /// Replaces the registered advancements with the configured datapacks,
    /// lays out the advancement tabs and brings already loaded players up to
    /// date. Returns how many advancements are registered.
    pub fn load_datapacks(&mut self) -> usize {
        self.registry.clear();
        let datapacks: Vec<PathBuf> = self.config.datapacks.clone();
        for path in &datapacks {
            match self.registry.load_datapack(path) {
                Ok(count) => log::info!("Loaded {count} advancement(s) from {}", path.display()),
                Err(err) => log::error!("Failed to load datapack: {err}"),
            }
        }
        self.registry.layout();

        let mut events = Vec::new();
        for tracker in self.players.values_mut() {
            events.extend(tracker.refresh(&self.registry));
        }
        self.dispatch(&events);
        self.registry.len()
    }

    /// Forwards events to every listener, in registration order.
    pub fn dispatch(&mut self, events: &[AdvancementEvent]) {
        for event in events {
            log::debug!("{event:?}");
            for listener in &mut self.listeners {
                listener.on_event(event, &self.registry);
            }
        }
    }

    /// Returns a player's tracker, loading it on first use.
    pub fn player(&mut self, name: &str) -> Result<&mut PlayerAdvancementTracker, StorageError> {
        if !self.players.contains_key(name) {
            let saved = self.storage.load(name)?;
            let mut tracker = PlayerAdvancementTracker::new(name);
            let events = tracker.load(&self.registry, saved);
            log::info!(
                "Loaded advancements of {name}: {} completed",
                tracker.completed_advancements().len()
            );
            self.players.insert(name.to_string(), tracker);
            self.dispatch(&events);
        }
        self.players
            .get_mut(name)
            .ok_or_else(|| StorageError::InvalidPlayerName(name.to_string()))
    }

    /// A player's tracker if it is already loaded.
    #[must_use]
    pub fn loaded_player(&self, name: &str) -> Option<&PlayerAdvancementTracker> {
        self.players.get(name)
    }

    /// Names of all loaded players, sorted.
    #[must_use]
    pub fn players(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.players.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Applies a change to a player's progress and dispatches what it caused.
    pub fn update<F>(
        &mut self,
        player: &str,
        change: F,
    ) -> Result<Vec<AdvancementEvent>, StorageError>
    where
        F: FnOnce(&AdvancementRegistry, &mut PlayerAdvancementTracker) -> Vec<AdvancementEvent>,
    {
        self.player(player)?;
        let events = match self.players.get_mut(player) {
            Some(tracker) => change(&self.registry, tracker),
            None => Vec::new(),
        };
        self.dispatch(&events);
        Ok(events)
    }

    /// Reports a game event for a player.
    pub fn trigger(
        &mut self,
        player: &str,
        context: &TriggerContext,
    ) -> Result<Vec<AdvancementEvent>, StorageError> {
        self.update(player, |registry, tracker| {
            AdvancementTriggers::trigger(registry, tracker, context)
        })
    }

    /// Writes one player's progress if it changed since the last save.
    pub fn save(&mut self, player: &str) -> Result<bool, StorageError> {
        let Some(tracker) = self.players.get_mut(player) else {
            return Ok(false);
        };
        if !tracker.has_pending_updates() {
            return Ok(false);
        }
        self.storage.save(player, tracker.saved_progress())?;
        tracker.take_dirty();
        Ok(true)
    }

    /// Saves every changed player, logging failures. Returns how many
    /// players were written.
    pub fn save_all(&mut self) -> usize {
        let names: Vec<String> = self.players.keys().cloned().collect();
        let mut saved = 0;
        for name in names {
            match self.save(&name) {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(err) => log::error!("Failed to save advancements of {name}: {err}"),
            }
        }
        if saved > 0 {
            log::info!("Saved advancements of {saved} player(s)");
        }
        saved
    }
}
