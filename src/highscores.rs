//! High score ledger
//!
//! One record in storage maps each game id to its top 5 results, best first.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::difficulty::Difficulty;
use crate::persistence::{Storage, StorageError, load_json, save_json};
use crate::sim::GameId;

/// Maximum number of high scores kept per game
pub const MAX_HIGH_SCORES: usize = 5;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// When the run ended (ISO-8601)
    pub date: DateTime<Utc>,
    /// Game-specific fields (level, lines, time...)
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HighScoreEntry {
    pub fn new(score: u64, difficulty: Difficulty, date: DateTime<Utc>) -> Self {
        Self {
            score,
            difficulty,
            date,
            details: Map::new(),
        }
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }
}

/// High score tables for every game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores {
    tables: BTreeMap<String, Vec<HighScoreEntry>>,
}

impl HighScores {
    /// Storage key of the ledger record
    pub const STORAGE_KEY: &'static str = "highScores";

    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for one game, best first
    pub fn entries(&self, game: GameId) -> &[HighScoreEntry] {
        self.tables
            .get(game.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check if a score qualifies for a game's table
    pub fn qualifies(&self, game: GameId, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        let entries = self.entries(game);
        if entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, game: GameId, score: u64) -> Option<usize> {
        if !self.qualifies(game, score) {
            return None;
        }
        let entries = self.entries(game);
        let rank = entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(entries.len()) + 1)
    }

    /// Add an entry to a game's table (if it qualifies).
    /// Returns the rank achieved (1-indexed).
    pub fn add_score(&mut self, game: GameId, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(game, entry.score) {
            return None;
        }
        let entries = self.tables.entry(game.as_str().to_string()).or_default();

        // Ties keep the older entry first
        let pos = entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                entries.insert(i, entry);
                i + 1
            }
            None => {
                entries.push(entry);
                entries.len()
            }
        };
        entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }

    /// Get a game's top score (if any)
    pub fn top_score(&self, game: GameId) -> Option<u64> {
        self.entries(game).first().map(|e| e.score)
    }

    /// Restore the sorted/capped shape of every table
    fn normalize(&mut self) {
        for entries in self.tables.values_mut() {
            entries.sort_by(|a, b| b.score.cmp(&a.score));
            entries.truncate(MAX_HIGH_SCORES);
        }
    }

    /// Load the ledger. Missing or corrupt data starts fresh.
    pub fn load(storage: &dyn Storage) -> Self {
        match load_json::<HighScores>(storage, Self::STORAGE_KEY) {
            Some(mut scores) => {
                scores.normalize();
                log::info!("Loaded high scores for {} games", scores.tables.len());
                scores
            }
            None => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        save_json(storage, Self::STORAGE_KEY, self)?;
        log::info!("High scores saved");
        Ok(())
    }

    /// Load, insert and save in one step. Returns the rank achieved, if any.
    pub fn record(
        storage: &mut dyn Storage,
        game: GameId,
        entry: HighScoreEntry,
    ) -> Result<Option<usize>, StorageError> {
        let mut scores = Self::load(storage);
        let rank = scores.add_score(game, entry);
        if rank.is_some() {
            scores.save(storage)?;
        }
        Ok(rank)
    }
}

/// Format a timestamp relative to `now`
pub fn format_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(date);
    let days = diff.num_days();
    let hours = diff.num_hours();
    let mins = diff.num_minutes();

    if days >= 1 {
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            date.format("%m/%d/%y").to_string()
        }
    } else if hours >= 1 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if mins >= 1 {
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
