//! Player preferences
//!
//! Persisted next to the high scores, one key per preference:
//! `retro-games-sound` holds the sound flag and `difficulty_<game>` the last
//! difficulty chosen for each game.

use std::collections::BTreeMap;

use crate::difficulty::Difficulty;
use crate::persistence::{Storage, StorageError};
use crate::sim::GameId;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Global sound preference
    pub sound_enabled: bool,
    /// Last difficulty picked per game
    difficulties: BTreeMap<GameId, Difficulty>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            difficulties: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Storage key for the sound flag
    pub const SOUND_KEY: &'static str = "retro-games-sound";

    /// Storage key for a game's difficulty
    pub fn difficulty_key(game: GameId) -> String {
        format!("difficulty_{}", game.as_str())
    }

    /// Difficulty to start `game` at
    pub fn difficulty(&self, game: GameId) -> Difficulty {
        self.difficulties.get(&game).copied().unwrap_or_default()
    }

    /// Change and immediately persist a game's difficulty
    pub fn set_difficulty(
        &mut self,
        storage: &mut dyn Storage,
        game: GameId,
        difficulty: Difficulty,
    ) -> Result<(), StorageError> {
        self.difficulties.insert(game, difficulty);
        storage.set(&Self::difficulty_key(game), difficulty.as_str())?;
        log::info!("Difficulty for {} set to {}", game, difficulty);
        Ok(())
    }

    /// Flip and persist the sound flag. Returns the new value.
    pub fn toggle_sound(&mut self, storage: &mut dyn Storage) -> Result<bool, StorageError> {
        self.sound_enabled = !self.sound_enabled;
        storage.set(Self::SOUND_KEY, if self.sound_enabled { "true" } else { "false" })?;
        Ok(self.sound_enabled)
    }

    /// Load preferences. Unreadable values fall back to defaults.
    pub fn load(storage: &dyn Storage) -> Self {
        let mut settings = Self::default();

        if let Some(raw) = storage.get(Self::SOUND_KEY) {
            match serde_json::from_str::<bool>(&raw) {
                Ok(enabled) => settings.sound_enabled = enabled,
                Err(_) => log::warn!("Ignoring invalid sound preference {raw:?}"),
            }
        }

        for game in GameId::ALL {
            let Some(raw) = storage.get(&Self::difficulty_key(game)) else {
                continue;
            };
            // Older writers stored the value JSON-quoted
            match Difficulty::from_str(raw.trim_matches('"')) {
                Some(d) => {
                    settings.difficulties.insert(game, d);
                }
                None => log::warn!("Ignoring invalid difficulty {raw:?} for {game}"),
            }
        }

        log::info!("Loaded settings");
        settings
    }

    /// Write every preference
    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.set(Self::SOUND_KEY, if self.sound_enabled { "true" } else { "false" })?;
        for (game, difficulty) in &self.difficulties {
            storage.set(&Self::difficulty_key(*game), difficulty.as_str())?;
        }
        log::info!("Settings saved");
        Ok(())
    }
}
