//! Game state and the session phase machine
//!
//! `GameState` is the single owned simulation state of one session. Phase
//! transitions only happen through the methods here; a transition that is not
//! valid from the current phase is a no-op returning `false`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{PlayArea, SpeedBand};
use super::entity::{EntityStore, Paddle};
use super::level;
use super::powerup::{EffectTarget, Modifiers, PowerUpKind, PowerUpScheduler};
use crate::GameKind;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Title screen, nothing simulated
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen; resumes exactly where it left off
    Paused,
    /// Short celebration before the next level is built
    LevelComplete,
    /// Lives exhausted
    GameOver,
}

impl Phase {
    /// Phases in which the loop driver keeps ticking
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Playing | Phase::LevelComplete)
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    WallBounce,
    PaddleHit,
    /// A rival car bumped the player vehicle
    Bump,
    ObstacleHit { id: u32, points: u64 },
    ObstacleDestroyed { id: u32, points: u64, center: Vec2 },
    CollectibleSpawned { id: u32, kind: PowerUpKind },
    PowerUpCollected(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    ProjectileFired,
    VehiclePassed { points: u64 },
    /// The last ball left the arena
    MoverLost,
    PlayerCrashed { shielded: bool },
    LevelCleared,
    LevelStarted(u32),
    GameOver { score: u64, new_high_score: bool },
}

/// Complete simulation state of one session
#[derive(Debug, Clone)]
pub struct GameState {
    pub game: GameKind,
    pub tuning: Tuning,
    pub phase: Phase,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    /// Best score, loaded once when the session is created
    pub high_score: u64,
    /// The paddle / player vehicle (singleton)
    pub paddle: Paddle,
    /// Everything else; replaced wholesale per level
    pub store: EntityStore,
    pub power_ups: PowerUpScheduler,
    pub modifiers: Modifiers,
    /// Racer distance travelled this level
    pub distance: f32,
    /// Frames left in the level-complete phase
    pub phase_timer: f32,
    /// Simulated tick counter
    pub frame: u64,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create a session state sitting in the menu
    pub fn new(game: GameKind, tuning: Tuning, seed: u64) -> Self {
        let paddle = Self::fresh_paddle(game, START_LEVEL, &tuning);
        Self {
            game,
            tuning,
            phase: Phase::Menu,
            score: 0,
            lives: START_LIVES,
            level: START_LEVEL,
            high_score: 0,
            paddle,
            store: EntityStore::new(),
            power_ups: PowerUpScheduler::new(),
            modifiers: Modifiers::default(),
            distance: 0.0,
            phase_timer: 0.0,
            frame: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn fresh_paddle(game: GameKind, level: u32, tuning: &Tuning) -> Paddle {
        match game {
            GameKind::Bricks => Paddle::bricks(level::paddle_width(game, level, tuning)),
            GameKind::Racer => Paddle::vehicle(level::speed_band(game, level, tuning).min),
        }
    }

    /// Area movers are confined to
    pub fn play_area(&self) -> PlayArea {
        match self.game {
            GameKind::Bricks => PlayArea::arena(),
            GameKind::Racer => PlayArea::road(),
        }
    }

    /// Level speed band with the slow-motion modifier applied
    pub fn speed_band(&self) -> SpeedBand {
        level::speed_band(self.game, self.level, &self.tuning).scaled(self.modifiers.speed_scale)
    }

    /// Split borrow handed to the power-up scheduler
    pub(crate) fn effect_parts(&mut self) -> (&mut PowerUpScheduler, EffectTarget<'_>) {
        let area = self.play_area();
        (
            &mut self.power_ups,
            EffectTarget {
                game: self.game,
                tuning: &self.tuning,
                paddle: &mut self.paddle,
                store: &mut self.store,
                modifiers: &mut self.modifiers,
                lives: &mut self.lives,
                bounds: (area.left, area.right),
            },
        )
    }

    pub fn apply_power_up(&mut self, kind: PowerUpKind) {
        let (scheduler, mut target) = self.effect_parts();
        scheduler.apply(kind, &mut target);
    }

    // === Transitions ===

    /// Menu → Playing
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Menu {
            return false;
        }
        self.new_game();
        true
    }

    /// GameOver → Playing
    pub fn play_again(&mut self) -> bool {
        if self.phase != Phase::GameOver {
            return false;
        }
        self.new_game();
        true
    }

    /// GameOver → Menu
    pub fn main_menu(&mut self) -> bool {
        if self.phase != Phase::GameOver {
            return false;
        }
        self.phase = Phase::Menu;
        log::info!("{:?}: back to menu", self.game);
        true
    }

    /// Playing → Paused
    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.phase = Phase::Paused;
        log::info!("{:?}: paused", self.game);
        true
    }

    /// Paused → Playing
    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Playing;
        log::info!("{:?}: resumed", self.game);
        true
    }

    /// Full reset: score, lives, level, modifiers and a rebuilt store
    fn new_game(&mut self) {
        {
            let (scheduler, mut target) = self.effect_parts();
            scheduler.clear(&mut target);
        }
        self.modifiers = Modifiers::default();
        self.score = 0;
        self.lives = START_LIVES;
        self.level = START_LEVEL;
        self.frame = 0;
        self.paddle = Self::fresh_paddle(self.game, self.level, &self.tuning);
        self.rebuild_level();
        self.phase = Phase::Playing;
        log::info!("{:?}: new game (high score {})", self.game, self.high_score);
    }

    /// Replace the store with a freshly built one for the current level
    fn rebuild_level(&mut self) {
        let area = self.play_area();
        self.paddle.base_width = level::paddle_width(self.game, self.level, &self.tuning);
        self.paddle.refresh_width(area.left, area.right);
        self.paddle.invulnerable = 0.0;
        self.paddle.fire_cooldown = 0.0;
        self.store = level::build_store(
            self.game,
            self.level,
            &self.tuning,
            &self.paddle,
            self.modifiers.speed_scale,
            &mut self.rng,
        );
        self.distance = 0.0;
    }

    /// Playing → LevelComplete
    fn complete_level(&mut self) {
        self.phase = Phase::LevelComplete;
        self.phase_timer = self.tuning.level_complete_delay;
        log::info!("{:?}: level {} complete (score {})", self.game, self.level, self.score);
    }

    /// LevelComplete → Playing on the next level
    pub(crate) fn advance_level(&mut self) -> bool {
        if self.phase != Phase::LevelComplete {
            return false;
        }
        self.level += 1;
        self.rebuild_level();
        self.phase = Phase::Playing;
        true
    }

    /// Playing → GameOver; returns true when the high score was beaten
    fn game_over(&mut self) -> bool {
        self.phase = Phase::GameOver;
        let beaten = self.score > self.high_score;
        if beaten {
            self.high_score = self.score;
        }
        log::info!(
            "{:?}: game over at level {} with {} points{}",
            self.game,
            self.level,
            self.score,
            if beaten { " (new high score)" } else { "" }
        );
        beaten
    }

    /// Apply the session-level consequences of a completed entity pass
    ///
    /// Scores are banked first, then losses; a game over takes precedence
    /// over a level clear reported in the same tick.
    pub(crate) fn resolve_events(&mut self, events: &mut Vec<GameEvent>) {
        let mut ball_lost = false;
        let mut cleared = false;
        for event in events.iter() {
            match event {
                GameEvent::ObstacleHit { points, .. }
                | GameEvent::ObstacleDestroyed { points, .. }
                | GameEvent::VehiclePassed { points } => {
                    self.score = self.score.saturating_add(*points);
                }
                GameEvent::MoverLost => {
                    self.lives = self.lives.saturating_sub(1);
                    ball_lost = true;
                }
                GameEvent::PlayerCrashed { shielded: false } => {
                    self.lives = self.lives.saturating_sub(1);
                }
                GameEvent::LevelCleared => cleared = true,
                _ => {}
            }
        }

        if self.lives == 0 {
            let new_high_score = self.game_over();
            events.push(GameEvent::GameOver {
                score: self.score,
                new_high_score,
            });
        } else if cleared {
            self.complete_level();
        } else if ball_lost {
            let speed_scale = self.modifiers.speed_scale;
            level::spawn_ball(
                &mut self.store,
                &self.paddle,
                self.level,
                &self.tuning,
                speed_scale,
                &mut self.rng,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(game: GameKind) -> GameState {
        let mut state = GameState::new(game, Tuning::default(), 1234);
        assert!(state.start());
        state
    }

    #[test]
    fn test_new_state_is_in_menu() {
        let state = GameState::new(GameKind::Bricks, Tuning::default(), 1);
        assert_eq!(state.phase, Phase::Menu);
        assert!(state.store.is_empty());
    }

    #[test]
    fn test_start_resets_and_builds() {
        let state = playing(GameKind::Bricks);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!((state.score, state.lives, state.level), (0, 3, 1));
        assert!(!state.store.obstacles.is_empty());
        assert_eq!(state.store.ball_count(), 1);
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut state = GameState::new(GameKind::Bricks, Tuning::default(), 1);
        assert!(!state.pause());
        assert!(!state.resume());
        assert!(!state.play_again());
        assert!(!state.main_menu());
        assert_eq!(state.phase, Phase::Menu);

        assert!(state.start());
        assert!(!state.start());
        assert!(!state.main_menu());
        assert!(state.pause());
        assert!(!state.pause());
        assert!(state.resume());
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn test_last_life_lost_ends_game() {
        let mut state = playing(GameKind::Bricks);
        state.lives = 1;
        state.score = 500;
        state.high_score = 200;
        let mut events = vec![GameEvent::MoverLost];
        state.resolve_events(&mut events);
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(state.high_score, 500);
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                score: 500,
                new_high_score: true
            })
        );
    }

    #[test]
    fn test_lost_ball_respawns_when_lives_remain() {
        let mut state = playing(GameKind::Bricks);
        state.store.movers.clear();
        let mut events = vec![GameEvent::MoverLost];
        state.resolve_events(&mut events);
        assert_eq!(state.lives, 2);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.store.ball_count(), 1);
    }

    #[test]
    fn test_game_over_beats_level_clear() {
        let mut state = playing(GameKind::Bricks);
        state.lives = 1;
        let mut events = vec![
            GameEvent::ObstacleDestroyed {
                id: 1,
                points: 50,
                center: Vec2::ZERO,
            },
            GameEvent::LevelCleared,
            GameEvent::MoverLost,
        ];
        state.resolve_events(&mut events);
        assert_eq!(state.score, 50);
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn test_shielded_crash_costs_nothing() {
        let mut state = playing(GameKind::Racer);
        let mut events = vec![GameEvent::PlayerCrashed { shielded: true }];
        state.resolve_events(&mut events);
        assert_eq!(state.lives, 3);
        let mut events = vec![GameEvent::PlayerCrashed { shielded: false }];
        state.resolve_events(&mut events);
        assert_eq!(state.lives, 2);
    }

    #[test]
    fn test_level_clear_then_advance_replaces_store() {
        let mut state = playing(GameKind::Bricks);
        let mut events = vec![GameEvent::LevelCleared];
        state.resolve_events(&mut events);
        assert_eq!(state.phase, Phase::LevelComplete);
        assert!(!state.pause());

        state.store.obstacles.clear();
        assert!(state.advance_level());
        assert_eq!(state.level, 2);
        assert_eq!(state.phase, Phase::Playing);
        assert!(!state.store.obstacles.is_empty());
        assert_eq!(state.paddle.base_width, 92.0);
    }

    #[test]
    fn test_play_again_and_menu_from_game_over() {
        let mut state = playing(GameKind::Racer);
        state.score = 10;
        state.lives = 1;
        state.resolve_events(&mut vec![GameEvent::PlayerCrashed { shielded: false }]);
        assert_eq!(state.phase, Phase::GameOver);
        assert!(state.play_again());
        assert_eq!((state.score, state.lives, state.level), (0, 3, 1));

        state.lives = 1;
        state.resolve_events(&mut vec![GameEvent::PlayerCrashed { shielded: false }]);
        assert!(state.main_menu());
        assert_eq!(state.phase, Phase::Menu);
    }

    #[test]
    fn test_new_game_reverts_power_ups() {
        let mut state = playing(GameKind::Bricks);
        state.apply_power_up(PowerUpKind::ExpandPaddle);
        state.apply_power_up(PowerUpKind::SlowMotion);
        state.lives = 1;
        state.resolve_events(&mut vec![GameEvent::MoverLost]);
        assert!(state.play_again());
        assert!(state.power_ups.is_empty());
        assert_eq!(state.modifiers, Modifiers::default());
        assert_eq!(state.paddle.width_scale, 1.0);
    }
}
