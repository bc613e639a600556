//! Browser LocalStorage store

use anyhow::anyhow;

use super::{HighScoreStore, SettingsStore};
use crate::GameKind;
use crate::highscores::HighScores;
use crate::settings::Settings;

fn local_storage() -> anyhow::Result<web_sys::Storage> {
    web_sys::window()
        .ok_or_else(|| anyhow!("no window"))?
        .local_storage()
        .map_err(|e| anyhow!("LocalStorage unavailable: {:?}", e))?
        .ok_or_else(|| anyhow!("LocalStorage disabled"))
}

/// Keeps the [`HighScores`] record under one LocalStorage key and the
/// [`Settings`] under another
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn read(&self) -> anyhow::Result<HighScores> {
        let storage = local_storage()?;
        match storage
            .get_item(HighScores::STORAGE_KEY)
            .map_err(|e| anyhow!("reading high scores: {:?}", e))?
        {
            Some(json) => HighScores::from_json(&json),
            None => Ok(HighScores::new()),
        }
    }
}

impl HighScoreStore for LocalStorageStore {
    fn load_high_score(&mut self, game: GameKind) -> anyhow::Result<u64> {
        Ok(self.read()?.get(game))
    }

    fn save_high_score(&mut self, game: GameKind, score: u64) -> anyhow::Result<()> {
        let mut scores = self.read().unwrap_or_default();
        scores.scores.insert(game.id().to_string(), score);
        local_storage()?
            .set_item(HighScores::STORAGE_KEY, &scores.to_json()?)
            .map_err(|e| anyhow!("writing high scores: {:?}", e))?;
        log::info!("High score for {} saved: {}", game.id(), score);
        Ok(())
    }
}

impl SettingsStore for LocalStorageStore {
    fn load_settings(&mut self) -> anyhow::Result<Settings> {
        Settings::load()
    }

    fn save_settings(&mut self, settings: &Settings) -> anyhow::Result<()> {
        settings.save()
    }
}
