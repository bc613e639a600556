//! Variable-step simulation tick
//!
//! One call advances the state by `time_scale` nominal 60 Hz frames. Every
//! motion, timer and countdown is multiplied by the time scale so the outcome
//! does not depend on the host frame rate.

use glam::Vec2;

use super::collision::{
    Walls, bounce_off, deflect_off_paddle, overlaps, reflect_off_walls, within_pickup_range,
};
use super::entity::{MoverKind, Obstacle, ObstacleKind};
use super::level;
use super::powerup::PowerUpKind;
use super::state::{GameEvent, GameState, Phase};
use crate::GameKind;
use crate::consts::*;

/// Gameplay input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Keyboard steering in [-1, 1]
    pub steer: f32,
    /// Absolute paddle / vehicle x from a pointer; overrides `steer`
    pub target_x: Option<f32>,
    pub accelerate: bool,
    pub brake: bool,
    pub fire: bool,
}

/// Obstacle destroyed this tick, spawned into debris after the pass
struct Wreck {
    center: Vec2,
    color: u32,
    power_up: Option<PowerUpKind>,
}

/// Advance the game by `time_scale` frames
///
/// Only `Playing` and `LevelComplete` do anything; other phases return no
/// events and leave the state untouched. `time_scale` is clamped to what the
/// loop driver can produce, and a non-finite scale counts as zero.
pub fn tick(state: &mut GameState, input: &TickInput, time_scale: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let time_scale = if time_scale.is_finite() {
        time_scale.clamp(0.0, MAX_DELTA_MS / FRAME_MS)
    } else {
        0.0
    };

    match state.phase {
        Phase::Playing => {}
        Phase::LevelComplete => {
            update_particles(state, time_scale);
            state.phase_timer -= time_scale;
            if state.phase_timer <= 0.0 && state.advance_level() {
                events.push(GameEvent::LevelStarted(state.level));
            }
            return events;
        }
        Phase::Menu | Phase::Paused | Phase::GameOver => return events,
    }

    state.frame += 1;
    let mut wrecks = Vec::new();

    steer(state, input, time_scale);
    fire(state, input, time_scale, &mut events);
    if state.game == GameKind::Racer {
        drive_road(state, time_scale, &mut events);
    }
    update_movers(state, time_scale, &mut events, &mut wrecks);
    update_projectiles(state, time_scale, &mut events, &mut wrecks);
    if state.game == GameKind::Racer {
        check_crash(state, time_scale, &mut events);
    }
    spawn_wreckage(state, wrecks, &mut events);
    update_collectibles(state, time_scale, &mut events);
    update_particles(state, time_scale);

    // Power-up timers
    let expired = {
        let (scheduler, mut target) = state.effect_parts();
        scheduler.age(time_scale, &mut target)
    };
    events.extend(expired.into_iter().map(GameEvent::PowerUpExpired));

    let cleared = match state.game {
        GameKind::Bricks => state.store.obstacles.is_empty(),
        GameKind::Racer => state.distance >= level::level_distance(state.level, &state.tuning),
    };
    if cleared {
        events.push(GameEvent::LevelCleared);
    }

    state.resolve_events(&mut events);
    events
}

fn steer(state: &mut GameState, input: &TickInput, time_scale: f32) {
    let area = state.play_area();
    let speed = match state.game {
        GameKind::Bricks => state.tuning.bricks.paddle_speed,
        GameKind::Racer => state.tuning.racer.steer_speed,
    };
    let paddle = &mut state.paddle;
    match input.target_x {
        Some(x) => paddle.body.pos.x = x,
        None => paddle.body.pos.x += input.steer.clamp(-1.0, 1.0) * speed * time_scale,
    }
    paddle.clamp_x(area.left, area.right);

    if state.game == GameKind::Racer {
        let band = level::speed_band(GameKind::Racer, state.level, &state.tuning);
        let t = &state.tuning.racer;
        // A speed burst may sit above the band; accelerating never adds to it
        let ceiling = paddle.speed.max(band.max);
        if input.accelerate {
            paddle.speed = (paddle.speed + t.acceleration * time_scale).min(ceiling);
        }
        if input.brake {
            paddle.speed -= t.acceleration * time_scale;
        }
        if paddle.speed > band.max {
            paddle.speed = (paddle.speed - t.burst_decay * time_scale).max(band.max);
        }
        paddle.speed = paddle.speed.max(band.min);
    }
}

fn fire(state: &mut GameState, input: &TickInput, time_scale: f32, events: &mut Vec<GameEvent>) {
    let paddle = &mut state.paddle;
    paddle.fire_cooldown = (paddle.fire_cooldown - time_scale).max(0.0);
    if !input.fire || paddle.fire_cooldown > 0.0 {
        return;
    }

    let laser = state.modifiers.laser;
    let cooldown = match state.game {
        GameKind::Bricks if !laser => return,
        GameKind::Bricks => state.tuning.bricks.fire_cooldown,
        GameKind::Racer => state.tuning.racer.fire_cooldown,
    };

    let y = paddle.body.top() - PROJECTILE_HEIGHT / 2.0;
    let vel = Vec2::new(0.0, -state.tuning.projectile_speed);
    if laser {
        let offset = (paddle.body.size.x / 2.0 - PROJECTILE_WIDTH).max(0.0);
        for dx in [-offset, offset] {
            state
                .store
                .spawn_projectile(Vec2::new(paddle.body.pos.x + dx, y), vel);
        }
    } else {
        state
            .store
            .spawn_projectile(Vec2::new(paddle.body.pos.x, y), vel);
    }
    paddle.fire_cooldown = cooldown;
    events.push(GameEvent::ProjectileFired);
}

/// Scroll the road, bring in new traffic and retire what fell behind
fn drive_road(state: &mut GameState, time_scale: f32, events: &mut Vec<GameEvent>) {
    let scroll = state.paddle.speed * state.modifiers.speed_scale * time_scale;
    state.distance += scroll;

    for obstacle in &mut state.store.obstacles {
        obstacle.body.integrate(time_scale);
        obstacle.body.pos.y += scroll;
    }

    // Keep roughly one row spacing between consecutive waves
    let spacing = state.tuning.racer.row_spacing;
    let highest = state
        .store
        .obstacles
        .iter()
        .map(|o| o.body.pos.y)
        .fold(f32::INFINITY, f32::min);
    if highest > spacing - VEHICLE_HEIGHT {
        let top_y = if highest.is_finite() {
            (highest - spacing).min(-VEHICLE_HEIGHT)
        } else {
            -VEHICLE_HEIGHT
        };
        level::spawn_traffic_wave(
            &mut state.store,
            state.level,
            &state.tuning,
            state.modifiers.speed_scale,
            top_y,
            &mut state.rng,
        );
    }

    let points = state.tuning.pass_score * state.level as u64;
    let mut passed = 0;
    state.store.obstacles.retain(|o| {
        let gone = o.body.top() > ARENA_HEIGHT;
        passed += gone as usize;
        !gone
    });
    for _ in 0..passed {
        events.push(GameEvent::VehiclePassed { points });
    }

    // Rivals that fell behind or raced far ahead are gone for good
    state.store.remove_movers_where(|m| {
        m.kind == MoverKind::Rival
            && (m.body.top() > ARENA_HEIGHT || m.body.bottom() < -ARENA_HEIGHT)
    });
}

/// Damage an obstacle on behalf of a ball or projectile
fn strike(
    obstacle: &mut Obstacle,
    level: u32,
    base_score: u64,
    destroy_score: u64,
    events: &mut Vec<GameEvent>,
    wrecks: &mut Vec<Wreck>,
) {
    let level = level as u64;
    let destroyed = obstacle.hit();
    events.push(GameEvent::ObstacleHit {
        id: obstacle.id,
        points: base_score * level,
    });
    if destroyed {
        events.push(GameEvent::ObstacleDestroyed {
            id: obstacle.id,
            points: destroy_score * level,
            center: obstacle.body.pos,
        });
        wrecks.push(Wreck {
            center: obstacle.body.pos,
            color: obstacle.color,
            power_up: obstacle.power_up,
        });
    }
}

fn update_movers(
    state: &mut GameState,
    time_scale: f32,
    events: &mut Vec<GameEvent>,
    wrecks: &mut Vec<Wreck>,
) {
    let band = state.speed_band();
    let area = state.play_area();
    let (walls, spin) = match state.game {
        GameKind::Bricks => (Walls::OPEN_BOTTOM, state.tuning.bricks.paddle_spin),
        GameKind::Racer => (Walls::SIDES, state.tuning.racer.rival_spin),
    };
    let (base_score, destroy_score) = (state.tuning.base_score, state.tuning.destroy_score);
    let level = state.level;
    let paddle = &state.paddle.body;
    let store = &mut state.store;

    // Sub-step so no mover advances more than one nominal frame at once.
    // A mover still resolves at most one obstacle per tick.
    let steps = time_scale.ceil().max(1.0);
    let step = time_scale / steps;
    let mut struck = vec![false; store.movers.len()];
    for _ in 0..steps as u32 {
        for (mover, struck) in store.movers.iter_mut().zip(struck.iter_mut()) {
            mover.body.integrate(step);

            if reflect_off_walls(&mut mover.body, &area, walls) {
                events.push(GameEvent::WallBounce);
            }

            if overlaps(&mover.body, paddle) {
                deflect_off_paddle(&mut mover.body, paddle, spin, band);
                events.push(match mover.kind {
                    MoverKind::Ball => GameEvent::PaddleHit,
                    MoverKind::Rival => GameEvent::Bump,
                });
            }

            // Only the first live obstacle in store order is resolved
            if let Some(obstacle) = store
                .obstacles
                .iter_mut()
                .filter(|_| !*struck)
                .find(|o| !o.is_destroyed() && overlaps(&mover.body, &o.body))
            {
                *struck = true;
                bounce_off(&mut mover.body, &obstacle.body);
                if mover.kind.damages_obstacles() {
                    strike(obstacle, level, base_score, destroy_score, events, wrecks);
                } else {
                    events.push(GameEvent::Bump);
                }
            }

            mover.body.vel = band.clamp(mover.body.vel);
        }
    }

    let balls_before = store.ball_count();
    store.remove_movers_where(|m| m.kind == MoverKind::Ball && m.body.top() > area.bottom);
    if balls_before > 0 && store.ball_count() == 0 {
        events.push(GameEvent::MoverLost);
    }
}

fn update_projectiles(
    state: &mut GameState,
    time_scale: f32,
    events: &mut Vec<GameEvent>,
    wrecks: &mut Vec<Wreck>,
) {
    let (base_score, destroy_score) = (state.tuning.base_score, state.tuning.destroy_score);
    let level = state.level;
    let store = &mut state.store;

    let mut spent = Vec::new();
    for projectile in &mut store.projectiles {
        projectile.body.integrate(time_scale);
        if let Some(obstacle) = store
            .obstacles
            .iter_mut()
            .find(|o| !o.is_destroyed() && overlaps(&projectile.body, &o.body))
        {
            strike(obstacle, level, base_score, destroy_score, events, wrecks);
            spent.push(projectile.id);
        } else if projectile.body.bottom() < 0.0 {
            spent.push(projectile.id);
        }
    }
    store.remove_projectiles_where(|p| spent.contains(&p.id));
}

/// Player vehicle against enemy traffic
fn check_crash(state: &mut GameState, time_scale: f32, events: &mut Vec<GameEvent>) {
    if state.paddle.invulnerable > 0.0 {
        state.paddle.invulnerable = (state.paddle.invulnerable - time_scale).max(0.0);
        return;
    }

    let paddle = &state.paddle.body;
    let Some(obstacle) = state.store.obstacles.iter_mut().find(|o| {
        o.kind == ObstacleKind::EnemyVehicle && !o.is_destroyed() && overlaps(paddle, &o.body)
    }) else {
        return;
    };

    obstacle.hit_points = 0;
    let (center, color) = (obstacle.body.pos, obstacle.color);
    let shielded = state.modifiers.shield;
    state.store.spawn_burst(
        &mut state.rng,
        center,
        color,
        state.tuning.particle_count * 2,
        state.tuning.particle_life,
        (state.tuning.particle_speed_min, state.tuning.particle_speed_max),
    );
    state.paddle.invulnerable = state.tuning.racer.invulnerable_frames;
    log::debug!("Player crashed at distance {:.0} (shielded: {})", state.distance, shielded);
    events.push(GameEvent::PlayerCrashed { shielded });
}

/// Turn this tick's destroyed obstacles into particles and tokens
fn spawn_wreckage(state: &mut GameState, wrecks: Vec<Wreck>, events: &mut Vec<GameEvent>) {
    let t = &state.tuning;
    for wreck in wrecks {
        state.store.spawn_burst(
            &mut state.rng,
            wreck.center,
            wreck.color,
            t.particle_count,
            t.particle_life,
            (t.particle_speed_min, t.particle_speed_max),
        );
        if let Some(kind) = wreck.power_up {
            let id = state.store.spawn_collectible(kind, wreck.center);
            events.push(GameEvent::CollectibleSpawned { id, kind });
        }
    }
    state.store.remove_obstacles_where(Obstacle::is_destroyed);
}

fn update_collectibles(state: &mut GameState, time_scale: f32, events: &mut Vec<GameEvent>) {
    let fall = match state.game {
        GameKind::Bricks => state.tuning.collectible_fall_speed,
        GameKind::Racer => state.paddle.speed * state.modifiers.speed_scale,
    } * time_scale;
    let radius = state.tuning.pickup_radius;
    let paddle = &state.paddle.body;

    let mut collected = Vec::new();
    state.store.collectibles.retain_mut(|c| {
        c.body.pos.y += fall;
        if within_pickup_range(c.body.pos, paddle, radius) {
            collected.push(c.kind);
            return false;
        }
        c.body.top() <= ARENA_HEIGHT
    });

    for kind in collected {
        events.push(GameEvent::PowerUpCollected(kind));
        state.apply_power_up(kind);
    }
}

fn update_particles(state: &mut GameState, time_scale: f32) {
    for particle in &mut state.store.particles {
        particle.body.integrate(time_scale);
        particle.life -= time_scale;
    }
    state.store.remove_particles_where(|p| p.life <= 0.0);
}
