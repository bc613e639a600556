//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Time advances only through the `time_scale` handed to [`tick`]
//! - Seeded RNG only
//! - Stable iteration order (store order, power-ups by kind)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod entity;
pub mod level;
pub mod powerup;
pub mod state;
pub mod tick;

pub use collision::{Axis, PlayArea, SpeedBand, Walls};
pub use entity::{
    Body, Collectible, EntityStore, Mover, MoverKind, Obstacle, ObstacleKind, Paddle, Particle,
    Projectile,
};
pub use powerup::{ActiveEffect, Modifiers, PowerUpKind, PowerUpScheduler};
pub use state::{GameEvent, GameState, Phase};
pub use tick::{TickInput, tick};
