//! Session lifecycle
//!
//! A [`Session`] is created when a mini-game mounts and dropped when the
//! player navigates away. It owns the simulation state, the loop driver, the
//! input buffer and every host collaborator. Dropping it stops the driver, so
//! no frame can reach a torn-down session.

use crate::GameKind;
use crate::audio::{AudioSink, NullAudio, SoundEffect};
use crate::persistence::{HighScoreStore, MemoryStore, SettingsStore};
use crate::platform::{Commands, FrameHandle, FrameScheduler, InputState, LoopDriver, RawInput};
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, Phase, tick};
use crate::snapshot::{FrameSnapshot, NullRenderer, RenderSink};
use crate::tuning::Tuning;

/// Host collaborators handed to a session
pub struct Host {
    pub storage: Box<dyn HighScoreStore>,
    pub settings: Box<dyn SettingsStore>,
    pub audio: Box<dyn AudioSink>,
    pub frames: Box<dyn FrameScheduler>,
    pub renderer: Box<dyn RenderSink>,
}

impl Host {
    pub fn new(
        storage: impl HighScoreStore + 'static,
        settings: impl SettingsStore + 'static,
        audio: impl AudioSink + 'static,
        frames: impl FrameScheduler + 'static,
        renderer: impl RenderSink + 'static,
    ) -> Self {
        Self {
            storage: Box::new(storage),
            settings: Box::new(settings),
            audio: Box::new(audio),
            frames: Box::new(frames),
            renderer: Box::new(renderer),
        }
    }

    /// In-memory storage, silent audio, discarded frames
    pub fn headless(frames: impl FrameScheduler + 'static) -> Self {
        let store = MemoryStore::new();
        Self::new(
            store.clone(),
            store,
            NullAudio,
            frames,
            NullRenderer::default(),
        )
    }
}

/// One mounted mini-game
pub struct Session {
    state: GameState,
    driver: LoopDriver,
    input: InputState,
    settings: Settings,
    storage: Box<dyn HighScoreStore>,
    settings_store: Box<dyn SettingsStore>,
    audio: Box<dyn AudioSink>,
    renderer: Box<dyn RenderSink>,
    snapshot: FrameSnapshot,
    torn_down: bool,
}

impl Session {
    /// Create a session in the menu, loading settings and the high score once
    pub fn new(game: GameKind, tuning: Tuning, host: Host, seed: u64) -> Self {
        let Host {
            mut storage,
            settings: mut settings_store,
            audio,
            frames,
            renderer,
        } = host;

        let settings = settings_store.load_settings().unwrap_or_else(|e| {
            log::warn!("Could not load settings, using defaults: {:#}", e);
            Settings::default()
        });

        let mut state = GameState::new(game, tuning, seed);
        state.high_score = storage.load_high_score(game).unwrap_or_else(|e| {
            log::warn!("Could not load {} high score, starting at 0: {:#}", game.id(), e);
            0
        });
        let snapshot = FrameSnapshot::capture(&state, settings.sound_enabled, settings.fullscreen);
        log::info!(
            "Session created: {} (seed {}, high score {})",
            game.id(),
            seed,
            state.high_score
        );

        let mut session = Self {
            state,
            driver: LoopDriver::new(frames),
            input: InputState::new(),
            settings,
            storage,
            settings_store,
            audio,
            renderer,
            snapshot,
            torn_down: false,
        };
        session.publish();
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for hosts that script a session (demos, tests)
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    pub fn is_loop_running(&self) -> bool {
        self.driver.is_running()
    }

    // === Transitions ===

    pub fn start(&mut self) -> bool {
        self.transition(GameState::start)
    }

    pub fn pause(&mut self) -> bool {
        self.transition(GameState::pause)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(GameState::resume)
    }

    pub fn play_again(&mut self) -> bool {
        self.transition(GameState::play_again)
    }

    pub fn main_menu(&mut self) -> bool {
        self.transition(GameState::main_menu)
    }

    /// Host lost focus or visibility: drop held keys and freeze
    pub fn suspend(&mut self) -> bool {
        self.input.clear();
        let paused = self.pause();
        if paused {
            log::info!("Auto-paused (focus lost)");
        }
        paused
    }

    /// Run a phase transition and bring the driver in line with the new phase
    fn transition(&mut self, apply: fn(&mut GameState) -> bool) -> bool {
        if self.torn_down || !apply(&mut self.state) {
            return false;
        }
        self.sync_driver();
        self.publish();
        true
    }

    fn sync_driver(&mut self) {
        if self.state.phase.is_running() {
            self.driver.start();
        } else {
            self.driver.stop();
        }
    }

    // === Input ===

    /// Buffer a host input event
    ///
    /// While the loop is idle (menu, paused, game over) nothing samples the
    /// buffer, so meta commands are applied right away.
    pub fn handle_input(&mut self, event: RawInput) {
        if self.torn_down {
            return;
        }
        self.input.push(event);
        if !self.state.phase.is_running() {
            let commands = self.input.sample();
            self.apply_commands(&commands);
        }
    }

    /// Apply non-gameplay commands; returns true if the phase changed
    fn apply_commands(&mut self, commands: &Commands) -> bool {
        if commands.toggle_sound {
            self.settings.toggle_sound();
        }
        if commands.toggle_fullscreen {
            self.settings.toggle_fullscreen();
        }
        if commands.toggle_sound || commands.toggle_fullscreen {
            self.save_settings();
        }

        let changed = match self.state.phase {
            Phase::Menu if commands.confirm => self.start(),
            Phase::Playing if commands.pause => self.pause(),
            Phase::Paused if commands.pause || commands.confirm => self.resume(),
            Phase::GameOver if commands.back => self.main_menu(),
            Phase::GameOver if commands.confirm => self.play_again(),
            _ => false,
        };
        if !changed && (commands.toggle_sound || commands.toggle_fullscreen) {
            self.publish();
        }
        changed
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings_store.save_settings(&self.settings) {
            log::warn!("Could not save settings: {:#}", e);
        }
    }

    // === Frames ===

    /// A scheduled frame fired
    ///
    /// Returns false (and touches nothing) for stale or cancelled frames and
    /// for frames delivered after teardown.
    pub fn frame(&mut self, handle: FrameHandle, now_ms: f64) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(time) = self.driver.begin_frame(handle, now_ms) else {
            return false;
        };
        if !self.state.phase.is_running() {
            self.driver.stop();
            return false;
        }

        let commands = self.input.sample();
        if self.apply_commands(&commands) {
            return true;
        }

        let events = tick(&mut self.state, &commands.tick_input(), time.time_scale);
        self.react(&events);
        self.publish();

        if self.state.phase.is_running() {
            self.driver.reschedule();
        } else {
            self.driver.stop();
        }
        true
    }

    /// Side effects of a tick's events
    fn react(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::GameOver {
                    score,
                    new_high_score: true,
                } => {
                    log::info!("New {} high score: {}", self.state.game.id(), score);
                    if let Err(e) = self.storage.save_high_score(self.state.game, *score) {
                        log::warn!("Could not save high score: {:#}", e);
                    }
                }
                GameEvent::LevelStarted(level) => {
                    log::info!("{} level {} started", self.state.game.id(), level);
                }
                _ => {}
            }
        }

        let volume = self.settings.effective_volume();
        if volume > 0.0 {
            for effect in SoundEffect::for_events(events) {
                if let Err(e) = self.audio.play(effect, volume) {
                    log::warn!("Sound {:?} failed: {:#}", effect, e);
                }
            }
        }
    }

    fn publish(&mut self) {
        self.snapshot = FrameSnapshot::capture(
            &self.state,
            self.settings.sound_enabled,
            self.settings.fullscreen,
        );
        self.renderer.present(&self.snapshot);
    }

    /// Stop the loop for good. Idempotent; also run on drop.
    pub fn teardown(&mut self) {
        self.driver.stop();
        self.input.clear();
        if !self.torn_down {
            self.torn_down = true;
            log::info!("Session torn down: {}", self.state.game.id());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
