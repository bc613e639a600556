//! Entities and the per-session entity store
//!
//! Every simulated object is a [`Body`] (centre position, velocity and
//! axis-aligned size) plus the fields its variant needs. The store keeps one
//! collection per variant; the paddle / player vehicle is a singleton owned by
//! the game state, never a store member.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;
use crate::consts::*;

/// Axis-aligned physical extent shared by every entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Centre position
    pub pos: Vec2,
    /// Displacement per reference frame
    pub vel: Vec2,
    /// Full width and height
    pub size: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    #[inline]
    pub fn half(&self) -> Vec2 {
        self.size * 0.5
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x - self.size.x * 0.5
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x * 0.5
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.size.y * 0.5
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y * 0.5
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Advance position by velocity scaled to the elapsed frame fraction
    #[inline]
    pub fn integrate(&mut self, time_scale: f32) {
        self.pos += self.vel * time_scale;
    }

    /// Distance from a point to the nearest point of this box (0 inside)
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let nearest = Vec2::new(
            point.x.clamp(self.left(), self.right()),
            point.y.clamp(self.top(), self.bottom()),
        );
        (point - nearest).length()
    }
}

/// Which kind of mover this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverKind {
    /// Brick game ball (damages obstacles)
    Ball,
    /// Racer rival car (bounces off traffic without damaging it)
    Rival,
}

impl MoverKind {
    pub fn damages_obstacles(&self) -> bool {
        matches!(self, MoverKind::Ball)
    }
}

/// An entity with velocity subject to collision reflection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mover {
    pub id: u32,
    pub kind: MoverKind,
    pub body: Body,
}

/// Which kind of obstacle this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Brick,
    EnemyVehicle,
}

/// A destructible entity with hit points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub body: Body,
    pub hit_points: u32,
    pub max_hit_points: u32,
    /// Palette colour (0xRRGGBB)
    pub color: u32,
    /// Power-up released when destroyed
    pub power_up: Option<PowerUpKind>,
}

impl Obstacle {
    /// Take one point of damage; returns true when this destroyed it
    pub fn hit(&mut self) -> bool {
        if self.hit_points == 0 {
            return false;
        }
        self.hit_points -= 1;
        self.hit_points == 0
    }

    pub fn is_destroyed(&self) -> bool {
        self.hit_points == 0
    }
}

/// A falling pickup granting a power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: PowerUpKind,
    pub body: Body,
}

/// A laser bolt travelling along one axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub body: Body,
}

/// Cosmetic debris with a decaying lifetime, never collides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub body: Body,
    pub color: u32,
    /// Frames left
    pub life: f32,
    pub max_life: f32,
}

/// The player's paddle (brick game) or vehicle (racer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub body: Body,
    /// Level-dependent width before modifiers
    pub base_width: f32,
    /// Multiplier applied by power-ups
    pub width_scale: f32,
    /// Racer forward speed (px/frame); unused by the brick game
    pub speed: f32,
    /// Frames of crash immunity left
    pub invulnerable: f32,
    /// Frames until the next shot may fire
    pub fire_cooldown: f32,
}

impl Paddle {
    /// Brick game paddle centred at the bottom of the arena
    pub fn bricks(base_width: f32) -> Self {
        let body = Body::new(
            Vec2::new(ARENA_WIDTH / 2.0, PADDLE_Y),
            Vec2::new(base_width, PADDLE_HEIGHT),
        );
        Self {
            body,
            base_width,
            width_scale: 1.0,
            speed: 0.0,
            invulnerable: 0.0,
            fire_cooldown: 0.0,
        }
    }

    /// Racer player vehicle in the second lane
    pub fn vehicle(speed: f32) -> Self {
        let body = Body::new(
            Vec2::new(crate::lane_center(1), PLAYER_Y),
            Vec2::new(VEHICLE_WIDTH, VEHICLE_HEIGHT),
        );
        Self {
            body,
            base_width: VEHICLE_WIDTH,
            width_scale: 1.0,
            speed,
            invulnerable: 0.0,
            fire_cooldown: 0.0,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.base_width * self.width_scale
    }

    /// Re-derive the collision width after a base or scale change
    pub fn refresh_width(&mut self, min_x: f32, max_x: f32) {
        self.body.size.x = self.width();
        self.clamp_x(min_x, max_x);
    }

    /// Keep the paddle fully inside [min_x, max_x]
    pub fn clamp_x(&mut self, min_x: f32, max_x: f32) {
        let half = self.body.size.x / 2.0;
        if max_x - min_x <= self.body.size.x {
            self.body.pos.x = (min_x + max_x) / 2.0;
        } else {
            self.body.pos.x = self.body.pos.x.clamp(min_x + half, max_x - half);
        }
    }
}

/// All non-singleton entities of one level
///
/// Replaced wholesale on level transitions. Removal is always by predicate
/// within the tick that invalidates an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub movers: Vec<Mover>,
    pub obstacles: Vec<Obstacle>,
    pub collectibles: Vec<Collectible>,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    pub fn spawn_mover(&mut self, kind: MoverKind, body: Body) -> u32 {
        let id = self.next_entity_id();
        self.movers.push(Mover { id, kind, body });
        id
    }

    pub fn spawn_obstacle(
        &mut self,
        kind: ObstacleKind,
        body: Body,
        hit_points: u32,
        color: u32,
        power_up: Option<PowerUpKind>,
    ) -> u32 {
        let id = self.next_entity_id();
        let hit_points = hit_points.max(1);
        self.obstacles.push(Obstacle {
            id,
            kind,
            body,
            hit_points,
            max_hit_points: hit_points,
            color,
            power_up,
        });
        id
    }

    pub fn spawn_collectible(&mut self, kind: PowerUpKind, center: Vec2) -> u32 {
        let id = self.next_entity_id();
        let body = Body::new(center, Vec2::splat(COLLECTIBLE_SIZE));
        self.collectibles.push(Collectible { id, kind, body });
        id
    }

    pub fn spawn_projectile(&mut self, center: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        let body = Body::new(center, Vec2::new(PROJECTILE_WIDTH, PROJECTILE_HEIGHT))
            .with_velocity(vel);
        self.projectiles.push(Projectile { id, body });
        id
    }

    /// Emit `count` particles from `center` with randomized outward velocity
    pub fn spawn_burst(
        &mut self,
        rng: &mut Pcg32,
        center: Vec2,
        color: u32,
        count: usize,
        life: f32,
        speed: (f32, f32),
    ) {
        let (min_speed, max_speed) = (speed.0.min(speed.1), speed.0.max(speed.1));
        for i in 0..count {
            // Evenly spread directions with jitter so bursts never clump
            let base = std::f32::consts::TAU * i as f32 / count.max(1) as f32;
            let angle = base + rng.random_range(-0.3..=0.3);
            let speed = rng.random_range(min_speed..=max_speed);
            let id = self.next_entity_id();
            let body = Body::new(center, Vec2::splat(PARTICLE_SIZE))
                .with_velocity(Vec2::new(angle.cos(), angle.sin()) * speed);
            self.particles.push(Particle {
                id,
                body,
                color,
                life,
                max_life: life,
            });
        }
    }

    pub fn remove_movers_where(&mut self, mut pred: impl FnMut(&Mover) -> bool) -> usize {
        let before = self.movers.len();
        self.movers.retain(|m| !pred(m));
        before - self.movers.len()
    }

    pub fn remove_obstacles_where(&mut self, mut pred: impl FnMut(&Obstacle) -> bool) -> usize {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| !pred(o));
        before - self.obstacles.len()
    }

    pub fn remove_collectibles_where(
        &mut self,
        mut pred: impl FnMut(&Collectible) -> bool,
    ) -> usize {
        let before = self.collectibles.len();
        self.collectibles.retain(|c| !pred(c));
        before - self.collectibles.len()
    }

    pub fn remove_projectiles_where(
        &mut self,
        mut pred: impl FnMut(&Projectile) -> bool,
    ) -> usize {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| !pred(p));
        before - self.projectiles.len()
    }

    pub fn remove_particles_where(&mut self, mut pred: impl FnMut(&Particle) -> bool) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !pred(p));
        before - self.particles.len()
    }

    pub fn ball_count(&self) -> usize {
        self.movers
            .iter()
            .filter(|m| m.kind == MoverKind::Ball)
            .count()
    }

    pub fn len(&self) -> usize {
        self.movers.len()
            + self.obstacles.len()
            + self.collectibles.len()
            + self.projectiles.len()
            + self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_body_edges() {
        let body = Body::new(Vec2::new(100.0, 50.0), Vec2::new(40.0, 20.0));
        assert_eq!(body.left(), 80.0);
        assert_eq!(body.right(), 120.0);
        assert_eq!(body.top(), 40.0);
        assert_eq!(body.bottom(), 60.0);
    }

    #[test]
    fn test_distance_to_point() {
        let body = Body::new(Vec2::new(0.0, 0.0), Vec2::new(20.0, 10.0));
        assert_eq!(body.distance_to(Vec2::new(5.0, 2.0)), 0.0);
        assert!((body.distance_to(Vec2::new(0.0, 15.0)) - 10.0).abs() < 1e-5);
        assert!((body.distance_to(Vec2::new(13.0, 9.0)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_obstacle_hit_saturates() {
        let mut store = EntityStore::new();
        store.spawn_obstacle(
            ObstacleKind::Brick,
            Body::new(Vec2::ZERO, Vec2::ONE),
            2,
            0xFF0000,
            None,
        );
        let brick = &mut store.obstacles[0];
        assert!(!brick.hit());
        assert!(brick.hit());
        assert!(brick.is_destroyed());
        assert!(!brick.hit());
        assert_eq!(brick.hit_points, 0);
        assert!(brick.hit_points <= brick.max_hit_points);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = EntityStore::new();
        let a = store.spawn_mover(MoverKind::Ball, Body::new(Vec2::ZERO, Vec2::ONE));
        let b = store.spawn_collectible(PowerUpKind::Laser, Vec2::ZERO);
        let c = store.spawn_projectile(Vec2::ZERO, Vec2::NEG_Y);
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn test_burst_spawns_fixed_count() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut store = EntityStore::new();
        store.spawn_burst(&mut rng, Vec2::new(10.0, 10.0), 0xFFFFFF, 8, 30.0, (1.0, 3.0));
        assert_eq!(store.particles.len(), 8);
        for p in &store.particles {
            let speed = p.body.speed();
            assert!((1.0..=3.0).contains(&speed));
            assert_eq!(p.body.pos, Vec2::new(10.0, 10.0));
            assert_eq!(p.life, 30.0);
        }
    }

    #[test]
    fn test_removal_on_empty_store_is_noop() {
        let mut store = EntityStore::new();
        assert_eq!(store.remove_movers_where(|_| true), 0);
        assert_eq!(store.remove_obstacles_where(|_| true), 0);
        assert_eq!(store.remove_particles_where(|_| true), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_paddle_width_follows_scale() {
        let mut paddle = Paddle::bricks(96.0);
        paddle.width_scale = 1.5;
        paddle.refresh_width(0.0, ARENA_WIDTH);
        assert_eq!(paddle.body.size.x, 144.0);
        paddle.body.pos.x = 0.0;
        paddle.clamp_x(0.0, ARENA_WIDTH);
        assert_eq!(paddle.body.left(), 0.0);
    }
}
