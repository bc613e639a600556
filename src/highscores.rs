//! Best-score record
//!
//! One best score per mini-game, keyed by [`GameKind::id`]. The record is the
//! JSON document every persistent store reads and writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::GameKind;

/// Best score per game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub scores: BTreeMap<String, u64>,
}

impl HighScores {
    /// Storage key shared by the file and LocalStorage stores
    pub const STORAGE_KEY: &'static str = "arcade_high_scores";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, game: GameKind) -> u64 {
        self.scores.get(game.id()).copied().unwrap_or(0)
    }

    /// Keep `score` if it beats the stored best; returns true if it did
    pub fn record(&mut self, game: GameKind, score: u64) -> bool {
        if score <= self.get(game) {
            return false;
        }
        self.scores.insert(game.id().to_string(), score);
        true
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_reads_zero() {
        let scores = HighScores::new();
        assert_eq!(scores.get(GameKind::Bricks), 0);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_record_only_keeps_better_scores() {
        let mut scores = HighScores::new();
        assert!(scores.record(GameKind::Racer, 300));
        assert!(!scores.record(GameKind::Racer, 300));
        assert!(!scores.record(GameKind::Racer, 100));
        assert!(scores.record(GameKind::Racer, 301));
        assert_eq!(scores.get(GameKind::Racer), 301);
        assert_eq!(scores.get(GameKind::Bricks), 0);
        assert!(!scores.record(GameKind::Bricks, 0));
    }

    #[test]
    fn test_json_uses_game_ids() {
        let mut scores = HighScores::new();
        scores.record(GameKind::Bricks, 1200);
        let json = scores.to_json().unwrap();
        assert!(json.contains("\"bricks\": 1200"));
        assert_eq!(HighScores::from_json(&json).unwrap(), scores);
        assert!(HighScores::from_json("not json").is_err());
    }
}
