//! Frame snapshot published to the renderer
//!
//! An immutable copy of everything a painter needs for one frame. The
//! simulation state stays the single source of truth; the snapshot is rebuilt
//! from it once per frame and never written back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::GameKind;
use crate::sim::level::level_distance;
use crate::sim::{GameState, MoverKind, ObstacleKind, Phase, PowerUpKind};

/// Which entity variant a view shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityVariant {
    Paddle { invulnerable: bool },
    Ball,
    Rival,
    Brick { hit_points: u32, max_hit_points: u32 },
    EnemyVehicle { hit_points: u32, max_hit_points: u32 },
    Collectible { kind: PowerUpKind },
    Projectile,
    Particle { alpha: f32 },
}

/// One drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    /// 0 for the paddle / player vehicle
    pub id: u32,
    pub center: Vec2,
    pub size: Vec2,
    /// 0xRRGGBB
    pub color: u32,
    pub variant: EntityVariant,
}

/// Active power-up as shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpStatus {
    pub kind: PowerUpKind,
    /// 1.0 when fresh, 0.0 at expiry
    pub fraction_remaining: f32,
}

/// HUD scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub high_score: u64,
    pub lives: u32,
    pub level: u32,
    pub power_ups: Vec<PowerUpStatus>,
    /// Racer only: progress through the level (0.0 - 1.0)
    pub progress: Option<f32>,
    /// Racer only: current forward speed
    pub speed: Option<f32>,
}

/// Everything the render sink sees for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub game: GameKind,
    pub phase: Phase,
    pub hud: Hud,
    /// Back to front
    pub entities: Vec<EntityView>,
    pub sound_enabled: bool,
    pub fullscreen: bool,
}

const PADDLE_COLOR: u32 = 0xEEEEEE;
const BALL_COLOR: u32 = 0xFFFFFF;
const RIVAL_COLOR: u32 = 0xFF4081;
const PROJECTILE_COLOR: u32 = 0xFF1D25;

impl FrameSnapshot {
    /// Copy the renderable parts of `state`
    pub fn capture(state: &GameState, sound_enabled: bool, fullscreen: bool) -> Self {
        let store = &state.store;
        let mut entities = Vec::with_capacity(store.len() + 1);

        for p in &store.particles {
            let alpha = if p.max_life > 0.0 {
                (p.life / p.max_life).clamp(0.0, 1.0)
            } else {
                0.0
            };
            entities.push(EntityView {
                id: p.id,
                center: p.body.pos,
                size: p.body.size,
                color: p.color,
                variant: EntityVariant::Particle { alpha },
            });
        }
        for o in &store.obstacles {
            let variant = match o.kind {
                ObstacleKind::Brick => EntityVariant::Brick {
                    hit_points: o.hit_points,
                    max_hit_points: o.max_hit_points,
                },
                ObstacleKind::EnemyVehicle => EntityVariant::EnemyVehicle {
                    hit_points: o.hit_points,
                    max_hit_points: o.max_hit_points,
                },
            };
            entities.push(EntityView {
                id: o.id,
                center: o.body.pos,
                size: o.body.size,
                color: o.color,
                variant,
            });
        }
        for c in &store.collectibles {
            entities.push(EntityView {
                id: c.id,
                center: c.body.pos,
                size: c.body.size,
                color: c.kind.color(),
                variant: EntityVariant::Collectible { kind: c.kind },
            });
        }
        for p in &store.projectiles {
            entities.push(EntityView {
                id: p.id,
                center: p.body.pos,
                size: p.body.size,
                color: PROJECTILE_COLOR,
                variant: EntityVariant::Projectile,
            });
        }
        for m in &store.movers {
            let (color, variant) = match m.kind {
                MoverKind::Ball => (BALL_COLOR, EntityVariant::Ball),
                MoverKind::Rival => (RIVAL_COLOR, EntityVariant::Rival),
            };
            entities.push(EntityView {
                id: m.id,
                center: m.body.pos,
                size: m.body.size,
                color,
                variant,
            });
        }
        if state.phase != Phase::Menu {
            entities.push(EntityView {
                id: 0,
                center: state.paddle.body.pos,
                size: state.paddle.body.size,
                color: PADDLE_COLOR,
                variant: EntityVariant::Paddle {
                    invulnerable: state.paddle.invulnerable > 0.0,
                },
            });
        }

        let racer = state.game == GameKind::Racer;
        let hud = Hud {
            score: state.score,
            high_score: state.high_score,
            lives: state.lives,
            level: state.level,
            power_ups: state
                .power_ups
                .iter()
                .map(|e| PowerUpStatus {
                    kind: e.kind,
                    fraction_remaining: e.fraction_remaining(),
                })
                .collect(),
            progress: racer.then(|| {
                let total = level_distance(state.level, &state.tuning);
                if total > 0.0 {
                    (state.distance / total).clamp(0.0, 1.0)
                } else {
                    1.0
                }
            }),
            speed: racer.then_some(state.paddle.speed * state.modifiers.speed_scale),
        };

        Self {
            frame: state.frame,
            game: state.game,
            phase: state.phase,
            hud,
            entities,
            sound_enabled,
            fullscreen,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receives one snapshot per frame
pub trait RenderSink {
    fn present(&mut self, snapshot: &FrameSnapshot);
}

/// Sink that only remembers how many frames it saw
#[derive(Debug, Clone, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl RenderSink for NullRenderer {
    fn present(&mut self, _snapshot: &FrameSnapshot) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_menu_snapshot_is_empty() {
        let state = GameState::new(GameKind::Bricks, Tuning::default(), 1);
        let snapshot = FrameSnapshot::capture(&state, true, false);
        assert_eq!(snapshot.phase, Phase::Menu);
        assert!(snapshot.entities.is_empty());
        assert_eq!(snapshot.hud.progress, None);
    }

    #[test]
    fn test_playing_snapshot_lists_everything() {
        let mut state = GameState::new(GameKind::Bricks, Tuning::default(), 1);
        state.start();
        state.apply_power_up(PowerUpKind::Laser);
        let snapshot = FrameSnapshot::capture(&state, false, true);

        assert_eq!(snapshot.entities.len(), state.store.len() + 1);
        assert!(matches!(
            snapshot.entities.last().map(|e| e.variant),
            Some(EntityVariant::Paddle { .. })
        ));
        assert_eq!(snapshot.hud.lives, 3);
        assert_eq!(snapshot.hud.power_ups.len(), 1);
        assert_eq!(snapshot.hud.power_ups[0].fraction_remaining, 1.0);
        assert!(!snapshot.sound_enabled && snapshot.fullscreen);
    }

    #[test]
    fn test_racer_hud_progress() {
        let mut state = GameState::new(GameKind::Racer, Tuning::default(), 1);
        state.start();
        state.distance = 3000.0;
        let snapshot = FrameSnapshot::capture(&state, true, false);
        assert_eq!(snapshot.hud.progress, Some(0.5));
        assert!(snapshot.hud.speed.is_some());
    }

    #[test]
    fn test_json_is_tagged() {
        let mut state = GameState::new(GameKind::Bricks, Tuning::default(), 1);
        state.start();
        let json = FrameSnapshot::capture(&state, true, false).to_json().unwrap();
        assert!(json.contains("\"type\":\"Ball\""));
        assert!(json.contains("\"phase\":\"Playing\""));
    }
}
