//! Level construction and difficulty curves
//!
//! Everything that depends on the level number lives here: speed bands,
//! launch arcs, paddle width, toughness and drop chances, plus the builders
//! that lay out a fresh entity store for a level.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::SpeedBand;
use super::entity::{Body, EntityStore, MoverKind, ObstacleKind, Paddle};
use super::powerup::PowerUpKind;
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{GameKind, lane_center, lane_width};

/// Row colours from top to bottom
const ROW_COLORS: &[u32] = &[
    0xFF0000, // Red
    0xFF7F00, // Orange
    0xFFFF00, // Yellow
    0x00FF00, // Green
    0x00BFFF, // Sky
    0x0000FF, // Blue
    0x4B0082, // Indigo
    0x9400D3, // Violet
];

#[inline]
fn steps(level: u32) -> f32 {
    level.saturating_sub(1) as f32
}

/// Mover speed band for a level (before the slow-motion modifier)
pub fn speed_band(game: GameKind, level: u32, tuning: &Tuning) -> SpeedBand {
    let n = steps(level);
    match game {
        GameKind::Bricks => {
            let t = &tuning.bricks;
            let max = (t.max_speed_base + t.max_speed_per_level * n).min(t.max_speed_cap);
            SpeedBand::new(t.min_speed_base + t.min_speed_per_level * n, max)
        }
        GameKind::Racer => {
            let t = &tuning.racer;
            SpeedBand::new(
                t.min_speed_base + t.min_speed_per_level * n,
                t.max_speed_base + t.max_speed_per_level * n,
            )
        }
    }
}

/// Half-angle (radians) of the launch cone around straight up
pub fn launch_half_angle(level: u32, tuning: &Tuning) -> f32 {
    let t = &tuning.bricks;
    (t.launch_arc_base_deg + t.launch_arc_per_level_deg * steps(level))
        .min(t.launch_arc_max_deg)
        .to_radians()
}

/// Paddle (or vehicle) width before power-up modifiers
pub fn paddle_width(game: GameKind, level: u32, tuning: &Tuning) -> f32 {
    match game {
        GameKind::Bricks => {
            let t = &tuning.bricks;
            (t.paddle_base_width - t.paddle_shrink_per_level * steps(level)).max(t.paddle_min_width)
        }
        GameKind::Racer => VEHICLE_WIDTH,
    }
}

pub fn brick_rows(level: u32, tuning: &Tuning) -> usize {
    let t = &tuning.bricks;
    (t.base_rows + level as usize).min(t.max_rows).max(1)
}

/// Hit points for an obstacle in `row` (row 0 is the farthest from the player)
pub fn row_hit_points(game: GameKind, row: usize, rows: usize, level: u32) -> u32 {
    let depth = rows.saturating_sub(1).saturating_sub(row) as u32;
    match game {
        GameKind::Bricks => 1 + (level + depth) / 4,
        GameKind::Racer => 1 + (level + row as u32) / 3,
    }
}

fn max_hit_points(game: GameKind, tuning: &Tuning) -> u32 {
    match game {
        GameKind::Bricks => tuning.bricks.max_hit_points,
        GameKind::Racer => tuning.racer.max_hit_points,
    }
}

/// Chance that a freshly laid obstacle carries a power-up
pub fn power_up_chance(game: GameKind, level: u32, tuning: &Tuning) -> f64 {
    let n = steps(level) as f64;
    let (base, per, max) = match game {
        GameKind::Bricks => {
            let t = &tuning.bricks;
            (t.power_up_chance_base, t.power_up_chance_per_level, t.power_up_chance_max)
        }
        GameKind::Racer => {
            let t = &tuning.racer;
            (t.power_up_chance_base, t.power_up_chance_per_level, t.power_up_chance_max)
        }
    };
    (base + per * n).clamp(0.0, max.clamp(0.0, 1.0))
}

/// Racer distance needed to clear a level
pub fn level_distance(level: u32, tuning: &Tuning) -> f32 {
    tuning.racer.level_distance_base + tuning.racer.level_distance_per_level * steps(level)
}

pub fn row_color(row: usize) -> u32 {
    ROW_COLORS[row % ROW_COLORS.len()]
}

/// Lay out a fresh store for `level`
pub fn build_store(
    game: GameKind,
    level: u32,
    tuning: &Tuning,
    paddle: &Paddle,
    speed_scale: f32,
    rng: &mut Pcg32,
) -> EntityStore {
    let mut store = EntityStore::new();
    match game {
        GameKind::Bricks => {
            build_brick_grid(&mut store, level, tuning, rng);
            spawn_ball(&mut store, paddle, level, tuning, speed_scale, rng);
        }
        GameKind::Racer => {
            spawn_traffic_wave(&mut store, level, tuning, speed_scale, -VEHICLE_HEIGHT, rng);
        }
    }
    log::info!(
        "{:?} level {} built: {} obstacles, {} movers",
        game,
        level,
        store.obstacles.len(),
        store.movers.len()
    );
    store
}

/// Rows × columns of bricks, toughest rows at the top
pub fn build_brick_grid(store: &mut EntityStore, level: u32, tuning: &Tuning, rng: &mut Pcg32) {
    let rows = brick_rows(level, tuning);
    let cols = BRICK_COLUMNS;
    let width = (ARENA_WIDTH - BRICK_GAP * (cols as f32 + 1.0)) / cols as f32;
    let chance = power_up_chance(GameKind::Bricks, level, tuning);
    let cap = max_hit_points(GameKind::Bricks, tuning);

    for row in 0..rows {
        let hit_points = row_hit_points(GameKind::Bricks, row, rows, level).min(cap);
        let y = BRICK_TOP_OFFSET + row as f32 * (BRICK_HEIGHT + BRICK_GAP) + BRICK_HEIGHT / 2.0;
        for col in 0..cols {
            let x = BRICK_GAP + col as f32 * (width + BRICK_GAP) + width / 2.0;
            let power_up = rng
                .random_bool(chance)
                .then(|| PowerUpKind::roll(GameKind::Bricks, rng));
            store.spawn_obstacle(
                ObstacleKind::Brick,
                Body::new(Vec2::new(x, y), Vec2::new(width, BRICK_HEIGHT)),
                hit_points,
                row_color(row),
                power_up,
            );
        }
    }
}

/// Launch a ball from just above the paddle
///
/// The direction is drawn uniformly from the level's launch cone around
/// straight up.
pub fn spawn_ball(
    store: &mut EntityStore,
    paddle: &Paddle,
    level: u32,
    tuning: &Tuning,
    speed_scale: f32,
    rng: &mut Pcg32,
) -> u32 {
    let band = speed_band(GameKind::Bricks, level, tuning).scaled(speed_scale);
    let half_angle = launch_half_angle(level, tuning);
    let angle = if half_angle > 0.0 {
        rng.random_range(-half_angle..=half_angle)
    } else {
        0.0
    };
    let speed = band.min * tuning.bricks.launch_speed_factor;
    let vel = band.clamp(Vec2::new(angle.sin(), -angle.cos()) * speed);
    let pos = Vec2::new(
        paddle.body.pos.x,
        paddle.body.top() - BALL_SIZE / 2.0 - 2.0,
    );
    store.spawn_mover(
        MoverKind::Ball,
        Body::new(pos, Vec2::splat(BALL_SIZE)).with_velocity(vel),
    )
}

/// Spawn a block of traffic rows starting at `top_y` and stacking upward
///
/// Each row leaves at least one lane open. A rival car may also join,
/// placed between the first two rows.
pub fn spawn_traffic_wave(
    store: &mut EntityStore,
    level: u32,
    tuning: &Tuning,
    speed_scale: f32,
    top_y: f32,
    rng: &mut Pcg32,
) {
    let t = &tuning.racer;
    let rows = t.rows_per_wave.max(1);
    let band = speed_band(GameKind::Racer, level, tuning);
    let cruise = band.min * t.traffic_cruise_factor * speed_scale;
    let chance = power_up_chance(GameKind::Racer, level, tuning);
    let cap = max_hit_points(GameKind::Racer, tuning);
    let size = Vec2::new(VEHICLE_WIDTH, VEHICLE_HEIGHT);

    for row in 0..rows {
        let y = top_y - row as f32 * t.row_spacing;
        let mut filled: Vec<bool> = (0..LANES)
            .map(|_| rng.random_bool(t.lane_fill_chance.clamp(0.0, 1.0)))
            .collect();
        if filled.iter().all(|f| *f) {
            let open = rng.random_range(0..LANES);
            filled[open] = false;
        }
        let hit_points = row_hit_points(GameKind::Racer, row, rows, level).min(cap);
        for (lane, _) in filled.iter().enumerate().filter(|(_, f)| **f) {
            let power_up = rng
                .random_bool(chance)
                .then(|| PowerUpKind::roll(GameKind::Racer, rng));
            store.spawn_obstacle(
                ObstacleKind::EnemyVehicle,
                Body::new(Vec2::new(lane_center(lane), y), size)
                    .with_velocity(Vec2::new(0.0, -cruise)),
                hit_points,
                row_color(row + level as usize),
                power_up,
            );
        }
    }

    if rng.random_bool(t.rival_chance.clamp(0.0, 1.0)) {
        let lane = rng.random_range(0..LANES);
        spawn_rival(store, lane, level, tuning, speed_scale, top_y - t.row_spacing / 2.0, rng);
    }
}

/// Place a weaving rival car in `lane`
pub fn spawn_rival(
    store: &mut EntityStore,
    lane: usize,
    level: u32,
    tuning: &Tuning,
    speed_scale: f32,
    y: f32,
    rng: &mut Pcg32,
) -> u32 {
    let band = speed_band(GameKind::Racer, level, tuning).scaled(speed_scale);
    let lateral = tuning.racer.rival_lateral_speed * speed_scale;
    let lateral = if rng.random_bool(0.5) { lateral } else { -lateral };
    let vel = band.clamp(Vec2::new(lateral, band.min));
    // Keep the rival within the lane grid even with a narrow road
    let x = lane_center(lane).clamp(
        ROAD_LEFT + VEHICLE_WIDTH / 2.0,
        ROAD_LEFT + lane_width() * LANES as f32 - VEHICLE_WIDTH / 2.0,
    );
    store.spawn_mover(
        MoverKind::Rival,
        Body::new(Vec2::new(x, y), Vec2::new(VEHICLE_WIDTH, VEHICLE_HEIGHT)).with_velocity(vel),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_speed_band_grows_with_level() {
        let tuning = Tuning::default();
        let l1 = speed_band(GameKind::Bricks, 1, &tuning);
        let l5 = speed_band(GameKind::Bricks, 5, &tuning);
        assert_eq!(l1, SpeedBand::new(4.0, 8.0));
        assert!(l5.min > l1.min && l5.max > l1.max);
        let l50 = speed_band(GameKind::Bricks, 50, &tuning);
        assert_eq!(l50.max, tuning.bricks.max_speed_cap);
        assert_eq!(l50.min, tuning.bricks.max_speed_cap);
    }

    #[test]
    fn test_paddle_shrinks_to_floor() {
        let tuning = Tuning::default();
        assert_eq!(paddle_width(GameKind::Bricks, 1, &tuning), 96.0);
        assert_eq!(paddle_width(GameKind::Bricks, 3, &tuning), 88.0);
        assert_eq!(paddle_width(GameKind::Bricks, 40, &tuning), 64.0);
    }

    #[test]
    fn test_power_up_chance_bounded() {
        let tuning = Tuning::default();
        let low = power_up_chance(GameKind::Bricks, 1, &tuning);
        let high = power_up_chance(GameKind::Bricks, 100, &tuning);
        assert!((low - 0.08).abs() < 1e-9);
        assert!((high - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_brick_grid_layout() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut store = EntityStore::new();
        build_brick_grid(&mut store, 1, &tuning, &mut rng);
        assert_eq!(store.obstacles.len(), 5 * BRICK_COLUMNS);

        // Same row: same colour and toughness; top rows at least as tough
        let first = &store.obstacles[0];
        let last_of_row = &store.obstacles[BRICK_COLUMNS - 1];
        assert_eq!(first.color, last_of_row.color);
        assert_eq!(first.hit_points, last_of_row.hit_points);
        let bottom = store.obstacles.last().unwrap();
        assert!(first.hit_points >= bottom.hit_points);

        for brick in &store.obstacles {
            assert!(brick.body.left() >= 0.0 && brick.body.right() <= ARENA_WIDTH);
            assert_eq!(brick.hit_points, brick.max_hit_points);
        }
    }

    #[test]
    fn test_brick_grid_is_deterministic_per_seed() {
        let tuning = Tuning::default();
        let build = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut store = EntityStore::new();
            build_brick_grid(&mut store, 4, &tuning, &mut rng);
            store
                .obstacles
                .iter()
                .map(|o| o.power_up)
                .collect::<Vec<_>>()
        };
        assert_eq!(build(42), build(42));
    }

    #[test]
    fn test_ball_launches_within_arc() {
        let tuning = Tuning::default();
        let paddle = Paddle::bricks(96.0);
        let mut rng = Pcg32::seed_from_u64(9);
        let half = launch_half_angle(1, &tuning);
        for _ in 0..100 {
            let mut store = EntityStore::new();
            spawn_ball(&mut store, &paddle, 1, &tuning, 1.0, &mut rng);
            let vel = store.movers[0].body.vel;
            assert!(vel.y < 0.0);
            let angle = vel.x.atan2(-vel.y);
            assert!(angle.abs() <= half + 1e-4);
            assert!(speed_band(GameKind::Bricks, 1, &tuning).contains(vel.length()));
        }
    }

    #[test]
    fn test_traffic_rows_leave_a_lane_open() {
        let mut tuning = Tuning::default();
        tuning.racer.lane_fill_chance = 1.0;
        tuning.racer.rival_chance = 0.0;
        let mut rng = Pcg32::seed_from_u64(5);
        let mut store = EntityStore::new();
        spawn_traffic_wave(&mut store, 1, &tuning, 1.0, -70.0, &mut rng);
        assert_eq!(store.obstacles.len(), tuning.racer.rows_per_wave * (LANES - 1));
        for obstacle in &store.obstacles {
            assert!(obstacle.body.vel.y < 0.0);
            assert_eq!(obstacle.kind, ObstacleKind::EnemyVehicle);
        }
    }

    #[test]
    fn test_rival_speed_in_band() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut store = EntityStore::new();
        spawn_rival(&mut store, 2, 3, &tuning, 1.0, -100.0, &mut rng);
        let rival = &store.movers[0];
        assert_eq!(rival.kind, MoverKind::Rival);
        assert!(speed_band(GameKind::Racer, 3, &tuning).contains(rival.body.speed()));
        assert!(rival.body.vel.y > 0.0);
    }
}
