//! High score and settings persistence
//!
//! The session talks to a [`HighScoreStore`] and a [`SettingsStore`]; every
//! failure is returned as an error and the session decides to ignore it.
//! Stores:
//! - [`MemoryStore`]: in-process, shared between clones (both traits)
//! - [`JsonFileStore`]: high scores as a JSON document on disk (native)
//! - [`SettingsFile`]: settings as a JSON document on disk (native)
//! - [`LocalStorageStore`]: browser LocalStorage (wasm32, both traits)

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod web;

use std::cell::RefCell;
use std::rc::Rc;

use crate::GameKind;
use crate::highscores::HighScores;
use crate::settings::Settings;

#[cfg(not(target_arch = "wasm32"))]
pub use file::{JsonFileStore, SettingsFile};
#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

/// Key-value access to per-game best scores
pub trait HighScoreStore {
    fn load_high_score(&mut self, game: GameKind) -> anyhow::Result<u64>;
    fn save_high_score(&mut self, game: GameKind, score: u64) -> anyhow::Result<()>;
}

/// Where player preferences live between sessions
pub trait SettingsStore {
    /// Stored settings, or the defaults when nothing was saved yet
    fn load_settings(&mut self) -> anyhow::Result<Settings>;
    fn save_settings(&mut self, settings: &Settings) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    scores: HighScores,
    saves: usize,
    settings: Option<Settings>,
}

/// In-memory store; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(game: GameKind, score: u64) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().scores.record(game, score);
        store
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().settings = Some(settings);
        store
    }

    /// Last saved settings, if any
    pub fn settings(&self) -> Option<Settings> {
        self.inner.borrow().settings.clone()
    }

    pub fn get(&self, game: GameKind) -> u64 {
        self.inner.borrow().scores.get(game)
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl HighScoreStore for MemoryStore {
    fn load_high_score(&mut self, game: GameKind) -> anyhow::Result<u64> {
        Ok(self.get(game))
    }

    fn save_high_score(&mut self, game: GameKind, score: u64) -> anyhow::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.scores.scores.insert(game.id().to_string(), score);
        inner.saves += 1;
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn load_settings(&mut self) -> anyhow::Result<Settings> {
        Ok(self.settings().unwrap_or_default())
    }

    fn save_settings(&mut self, settings: &Settings) -> anyhow::Result<()> {
        self.inner.borrow_mut().settings = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load_high_score(GameKind::Bricks).unwrap(), 0);
        store.save_high_score(GameKind::Bricks, 900).unwrap();
        assert_eq!(store.load_high_score(GameKind::Bricks).unwrap(), 900);
        assert_eq!(store.load_high_score(GameKind::Racer).unwrap(), 0);
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryStore::with_score(GameKind::Racer, 40);
        let mut handle = store.clone();
        handle.save_high_score(GameKind::Racer, 50).unwrap();
        assert_eq!(store.get(GameKind::Racer), 50);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_memory_store_settings() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load_settings().unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.toggle_fullscreen();
        store.save_settings(&settings).unwrap();
        assert_eq!(store.clone().load_settings().unwrap(), settings);
        assert_eq!(store.save_count(), 0);
    }
}
