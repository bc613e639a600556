//! JSON file store for native builds

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{HighScoreStore, SettingsStore};
use crate::GameKind;
use crate::highscores::HighScores;
use crate::settings::Settings;

/// Keeps the whole [`HighScores`] record in one JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record; a missing file is an empty record
    fn read(&self) -> anyhow::Result<HighScores> {
        if !self.path.exists() {
            return Ok(HighScores::new());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        HighScores::from_json(&json).with_context(|| format!("parsing {}", self.path.display()))
    }

    /// Write via a temp file then rename, so a crash never truncates the record
    fn write(&self, scores: &HighScores) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, scores.to_json()?).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl HighScoreStore for JsonFileStore {
    fn load_high_score(&mut self, game: GameKind) -> anyhow::Result<u64> {
        Ok(self.read()?.get(game))
    }

    fn save_high_score(&mut self, game: GameKind, score: u64) -> anyhow::Result<()> {
        let mut scores = self.read().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable high scores: {:#}", e);
            HighScores::new()
        });
        scores.scores.insert(game.id().to_string(), score);
        self.write(&scores)?;
        log::info!("High score for {} saved: {}", game.id(), score);
        Ok(())
    }
}

/// Keeps [`Settings`] in their own JSON file
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for SettingsFile {
    fn load_settings(&mut self) -> anyhow::Result<Settings> {
        Settings::load_from(&self.path)
    }

    fn save_settings(&mut self, settings: &Settings) -> anyhow::Result<()> {
        settings.save_to(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("scores.json"));
        assert_eq!(store.load_high_score(GameKind::Bricks).unwrap(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.json");
        let mut store = JsonFileStore::new(&path);
        store.save_high_score(GameKind::Bricks, 700).unwrap();
        store.save_high_score(GameKind::Racer, 90).unwrap();

        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_high_score(GameKind::Bricks).unwrap(), 700);
        assert_eq!(reopened.load_high_score(GameKind::Racer).unwrap(), 90);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error_then_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, "{ broken").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(store.load_high_score(GameKind::Racer).is_err());

        store.save_high_score(GameKind::Racer, 5).unwrap();
        assert_eq!(store.load_high_score(GameKind::Racer).unwrap(), 5);
    }

    #[test]
    fn test_settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsFile::new(dir.path().join("settings.json"));
        assert_eq!(store.load_settings().unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.toggle_sound();
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings().unwrap(), settings);
    }
}
