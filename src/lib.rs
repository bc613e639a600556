//! Arcade Core - shared simulation engine for the embedded mini-games
//!
//! Core modules:
//! - `sim`: Simulation (entities, physics, collisions, power-ups, phases)
//! - `platform`: Loop driver and input normalization
//! - `persistence`: High score storage collaborators
//! - `session`: Session lifecycle tying the simulation to its host
//! - `tuning`: Data-driven game balance
//! - `web`: Browser bindings (wasm32 only)

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScores;
pub use session::{Host, Session};
pub use settings::Settings;
pub use snapshot::FrameSnapshot;
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};

/// Which mini-game a session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameKind {
    /// Brick-breaking game (paddle, balls, brick grid)
    Bricks,
    /// Top-down racer (player vehicle, traffic, rivals)
    Racer,
}

impl GameKind {
    /// Stable identifier used as the persistence key
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::Bricks => "bricks",
            GameKind::Racer => "racer",
        }
    }
}

/// Game configuration constants
pub mod consts {
    /// Reference frame rate the per-frame tuning values are expressed in
    pub const TARGET_FPS: f32 = 60.0;
    /// Milliseconds per reference frame
    pub const FRAME_MS: f32 = 1000.0 / TARGET_FPS;
    /// Largest wall-clock delta a single tick may consume (~2 frames)
    pub const MAX_DELTA_MS: f32 = 32.0;

    /// Play area dimensions (y grows downward)
    pub const ARENA_WIDTH: f32 = 480.0;
    pub const ARENA_HEIGHT: f32 = 640.0;

    /// Brick game paddle
    pub const PADDLE_Y: f32 = 600.0;
    pub const PADDLE_HEIGHT: f32 = 14.0;

    /// Brick game ball
    pub const BALL_SIZE: f32 = 12.0;

    /// Brick grid
    pub const BRICK_COLUMNS: usize = 10;
    pub const BRICK_HEIGHT: f32 = 18.0;
    pub const BRICK_GAP: f32 = 4.0;
    pub const BRICK_TOP_OFFSET: f32 = 60.0;

    /// Racer road
    pub const ROAD_LEFT: f32 = 40.0;
    pub const ROAD_RIGHT: f32 = 440.0;
    pub const LANES: usize = 4;
    pub const VEHICLE_WIDTH: f32 = 40.0;
    pub const VEHICLE_HEIGHT: f32 = 70.0;
    pub const PLAYER_Y: f32 = 560.0;

    /// Shared entity sizes
    pub const COLLECTIBLE_SIZE: f32 = 16.0;
    pub const PROJECTILE_WIDTH: f32 = 4.0;
    pub const PROJECTILE_HEIGHT: f32 = 12.0;
    pub const PARTICLE_SIZE: f32 = 3.0;

    /// Lives at the start of a game, and the most a player can bank
    pub const START_LIVES: u32 = 3;
    pub const MAX_LIVES: u32 = 9;
    pub const START_LEVEL: u32 = 1;
}

/// Width of one racer lane
#[inline]
pub fn lane_width() -> f32 {
    (consts::ROAD_RIGHT - consts::ROAD_LEFT) / consts::LANES as f32
}

/// Centre x coordinate of a racer lane (clamped to the last lane)
#[inline]
pub fn lane_center(lane: usize) -> f32 {
    let lane = lane.min(consts::LANES - 1);
    consts::ROAD_LEFT + lane_width() * (lane as f32 + 0.5)
}
