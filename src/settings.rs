//! Player preferences
//!
//! Persisted separately from high scores: a JSON file on native builds,
//! LocalStorage on the web. A missing record loads as the defaults; an
//! unreadable one is an error the session logs before using the defaults.

use serde::{Deserialize, Serialize};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sound effects on/off
    pub sound_enabled: bool,
    /// Host should present the game fullscreen
    pub fullscreen: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            fullscreen: false,
            master_volume: 0.8,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "arcade_settings";

    /// Volume to actually play at (0 when muted)
    pub fn effective_volume(&self) -> f32 {
        if self.sound_enabled {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        log::info!("Sound {}", if self.sound_enabled { "on" } else { "off" });
        self.sound_enabled
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        log::info!("Fullscreen {}", if self.fullscreen { "on" } else { "off" });
        self.fullscreen
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.master_volume = settings.master_volume.clamp(0.0, 1.0);
        Ok(settings)
    }

    /// Load settings from a JSON file; a missing file gives the defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings =
            Self::from_json(&json).with_context(|| format!("parsing {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        use anyhow::Context;

        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> anyhow::Result<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| anyhow::anyhow!("LocalStorage unavailable"))?;
        match storage
            .get_item(Self::STORAGE_KEY)
            .map_err(|e| anyhow::anyhow!("reading settings: {:?}", e))?
        {
            Some(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from LocalStorage");
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> anyhow::Result<()> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| anyhow::anyhow!("LocalStorage unavailable"))?;
        storage
            .set_item(Self::STORAGE_KEY, &serde_json::to_string(self)?)
            .map_err(|e| anyhow::anyhow!("writing settings: {:?}", e))?;
        log::info!("Settings saved");
        Ok(())
    }
}
