//! Timed and instantaneous power-ups
//!
//! Power-up kinds form a closed enum; `apply` and `revert` match on it
//! exhaustively. Durable kinds remember the exact factor they applied so the
//! revert divides it back out, restoring whatever baseline is current at
//! expiry (a level change may have moved it in between).

use std::collections::BTreeMap;

use glam::{Mat2, Vec2};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{EntityStore, MoverKind, Paddle};
use crate::GameKind;
use crate::consts::MAX_LIVES;
use crate::tuning::Tuning;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Wider paddle
    ExpandPaddle,
    /// Everything that moves slows down
    SlowMotion,
    /// Enables (brick game) or doubles (racer) laser fire
    Laser,
    /// Absorbs racer crashes
    Shield,
    /// Two extra balls
    MultiBall,
    /// One more life
    ExtraLife,
    /// Instant jump in racer speed
    SpeedBurst,
}

const BRICK_DROPS: &[PowerUpKind] = &[
    PowerUpKind::ExpandPaddle,
    PowerUpKind::SlowMotion,
    PowerUpKind::Laser,
    PowerUpKind::MultiBall,
    PowerUpKind::ExtraLife,
];

const RACER_DROPS: &[PowerUpKind] = &[
    PowerUpKind::Shield,
    PowerUpKind::SlowMotion,
    PowerUpKind::Laser,
    PowerUpKind::SpeedBurst,
    PowerUpKind::ExtraLife,
];

impl PowerUpKind {
    /// Duration in frames; 0 means the effect is instantaneous
    ///
    /// Durable kinds always last at least one frame.
    pub fn duration(self, tuning: &Tuning) -> f32 {
        let frames = match self {
            PowerUpKind::ExpandPaddle => tuning.expand_duration,
            PowerUpKind::SlowMotion => tuning.slow_duration,
            PowerUpKind::Laser => tuning.laser_duration,
            PowerUpKind::Shield => tuning.shield_duration,
            PowerUpKind::MultiBall | PowerUpKind::ExtraLife | PowerUpKind::SpeedBurst => {
                return 0.0;
            }
        };
        frames.max(1.0)
    }

    pub fn is_instant(self) -> bool {
        matches!(
            self,
            PowerUpKind::MultiBall | PowerUpKind::ExtraLife | PowerUpKind::SpeedBurst
        )
    }

    /// Kinds that bricks / traffic of a game may carry
    pub fn drop_table(game: GameKind) -> &'static [PowerUpKind] {
        match game {
            GameKind::Bricks => BRICK_DROPS,
            GameKind::Racer => RACER_DROPS,
        }
    }

    pub fn roll(game: GameKind, rng: &mut Pcg32) -> Self {
        let table = Self::drop_table(game);
        table[rng.random_range(0..table.len())]
    }

    /// Token colour (0xRRGGBB)
    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::ExpandPaddle => 0x3FA9F5,
            PowerUpKind::SlowMotion => 0x7AC943,
            PowerUpKind::Laser => 0xFF1D25,
            PowerUpKind::Shield => 0x93278F,
            PowerUpKind::MultiBall => 0xFF7BAC,
            PowerUpKind::ExtraLife => 0xFFD700,
            PowerUpKind::SpeedBurst => 0xFF931E,
        }
    }
}

/// Global gameplay modifiers toggled by power-ups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Multiplier on every velocity and on the speed band
    pub speed_scale: f32,
    pub laser: bool,
    pub shield: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed_scale: 1.0,
            laser: false,
            shield: false,
        }
    }
}

/// What a durable power-up changed, kept for its exact inverse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Applied {
    PaddleScale(f32),
    SpeedScale(f32),
    Laser,
    Shield,
}

/// A durable power-up currently in effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    /// Frames left
    pub remaining: f32,
    /// Frames granted on the latest pickup
    pub duration: f32,
    applied: Applied,
}

impl ActiveEffect {
    /// 1.0 when freshly applied, 0.0 at expiry
    pub fn fraction_remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Mutable view of everything a power-up may touch
pub struct EffectTarget<'a> {
    pub game: GameKind,
    pub tuning: &'a Tuning,
    pub paddle: &'a mut Paddle,
    pub store: &'a mut EntityStore,
    pub modifiers: &'a mut Modifiers,
    pub lives: &'a mut u32,
    /// Horizontal extent the paddle must stay inside
    pub bounds: (f32, f32),
}

impl EffectTarget<'_> {
    fn scale_velocities(&mut self, factor: f32) {
        for mover in &mut self.store.movers {
            mover.body.vel *= factor;
        }
        for obstacle in &mut self.store.obstacles {
            obstacle.body.vel *= factor;
        }
    }
}

/// Tracks durable power-ups and ages them each tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpScheduler {
    active: BTreeMap<PowerUpKind, ActiveEffect>,
}

impl PowerUpScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a power-up
    ///
    /// Instant kinds mutate state once. Durable kinds are applied on first
    /// pickup; picking one up again while active only refreshes its timer.
    pub fn apply(&mut self, kind: PowerUpKind, target: &mut EffectTarget) {
        if kind.is_instant() {
            apply_instant(kind, target);
            log::debug!("Power-up {:?} applied (instant)", kind);
            return;
        }

        let duration = kind.duration(target.tuning);

        if let Some(effect) = self.active.get_mut(&kind) {
            effect.remaining = duration;
            effect.duration = duration;
            log::debug!("Power-up {:?} refreshed", kind);
            return;
        }

        let applied = match kind {
            PowerUpKind::ExpandPaddle => {
                let factor = target.tuning.expand_factor;
                target.paddle.width_scale *= factor;
                target.paddle.refresh_width(target.bounds.0, target.bounds.1);
                Applied::PaddleScale(factor)
            }
            PowerUpKind::SlowMotion => {
                let factor = target.tuning.slow_factor;
                target.modifiers.speed_scale *= factor;
                target.scale_velocities(factor);
                Applied::SpeedScale(factor)
            }
            PowerUpKind::Laser => {
                target.modifiers.laser = true;
                Applied::Laser
            }
            PowerUpKind::Shield => {
                target.modifiers.shield = true;
                Applied::Shield
            }
            PowerUpKind::MultiBall | PowerUpKind::ExtraLife | PowerUpKind::SpeedBurst => return,
        };
        self.active.insert(
            kind,
            ActiveEffect {
                kind,
                remaining: duration,
                duration,
                applied,
            },
        );
        log::debug!("Power-up {:?} applied for {} frames", kind, duration);
    }

    /// Count every active effect down by `time_scale`, reverting the expired
    pub fn age(&mut self, time_scale: f32, target: &mut EffectTarget) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        for effect in self.active.values_mut() {
            effect.remaining -= time_scale;
            if effect.remaining <= 0.0 {
                expired.push(effect.kind);
            }
        }
        for kind in &expired {
            if let Some(effect) = self.active.remove(kind) {
                revert(effect.applied, target);
                log::debug!("Power-up {:?} expired", kind);
            }
        }
        expired
    }

    /// Revert and forget every active effect
    pub fn clear(&mut self, target: &mut EffectTarget) {
        for (_, effect) in std::mem::take(&mut self.active) {
            revert(effect.applied, target);
        }
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn remaining(&self, kind: PowerUpKind) -> Option<f32> {
        self.active.get(&kind).map(|e| e.remaining)
    }

    /// Active effects in stable kind order
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active.values()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

fn apply_instant(kind: PowerUpKind, target: &mut EffectTarget) {
    match kind {
        PowerUpKind::ExtraLife => {
            *target.lives = (*target.lives + 1).min(MAX_LIVES);
        }
        PowerUpKind::SpeedBurst => {
            target.paddle.speed += target.tuning.speed_burst;
        }
        PowerUpKind::MultiBall => {
            let Some(source) = target
                .store
                .movers
                .iter()
                .find(|m| m.kind == MoverKind::Ball)
                .map(|m| m.body)
            else {
                return;
            };
            let spread = target.tuning.multi_ball_spread;
            for angle in [spread, -spread] {
                let vel: Vec2 = Mat2::from_angle(angle) * source.vel;
                target
                    .store
                    .spawn_mover(MoverKind::Ball, source.with_velocity(vel));
            }
        }
        PowerUpKind::ExpandPaddle
        | PowerUpKind::SlowMotion
        | PowerUpKind::Laser
        | PowerUpKind::Shield => {}
    }
}

fn revert(applied: Applied, target: &mut EffectTarget) {
    match applied {
        Applied::PaddleScale(factor) => {
            target.paddle.width_scale /= factor;
            target.paddle.refresh_width(target.bounds.0, target.bounds.1);
        }
        Applied::SpeedScale(factor) => {
            target.modifiers.speed_scale /= factor;
            target.scale_velocities(1.0 / factor);
        }
        Applied::Laser => target.modifiers.laser = false,
        Applied::Shield => target.modifiers.shield = false,
    }
}
