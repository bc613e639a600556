//! Data-driven game balance
//!
//! Every gameplay number that is not pure geometry lives here so a level
//! designer can tweak the feel without touching simulation code. Values are
//! expressed per 60 Hz reference frame; the loop driver's time scale converts
//! them to wall-clock time.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Balance values for the brick game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickTuning {
    pub paddle_base_width: f32,
    pub paddle_shrink_per_level: f32,
    pub paddle_min_width: f32,
    /// Keyboard paddle speed (px/frame)
    pub paddle_speed: f32,
    pub min_speed_base: f32,
    pub min_speed_per_level: f32,
    pub max_speed_base: f32,
    pub max_speed_per_level: f32,
    pub max_speed_cap: f32,
    /// Launch speed as a multiple of the band minimum
    pub launch_speed_factor: f32,
    /// Launch arc half-angle in degrees
    pub launch_arc_base_deg: f32,
    pub launch_arc_per_level_deg: f32,
    pub launch_arc_max_deg: f32,
    /// Horizontal velocity added at the paddle edge
    pub paddle_spin: f32,
    pub base_rows: usize,
    pub max_rows: usize,
    pub max_hit_points: u32,
    pub power_up_chance_base: f64,
    pub power_up_chance_per_level: f64,
    pub power_up_chance_max: f64,
    pub fire_cooldown: f32,
}

impl Default for BrickTuning {
    fn default() -> Self {
        Self {
            paddle_base_width: 96.0,
            paddle_shrink_per_level: 4.0,
            paddle_min_width: 64.0,
            paddle_speed: 8.0,
            min_speed_base: 4.0,
            min_speed_per_level: 0.25,
            max_speed_base: 8.0,
            max_speed_per_level: 0.5,
            max_speed_cap: 14.0,
            launch_speed_factor: 1.25,
            launch_arc_base_deg: 30.0,
            launch_arc_per_level_deg: 2.5,
            launch_arc_max_deg: 45.0,
            paddle_spin: 3.0,
            base_rows: 4,
            max_rows: 8,
            max_hit_points: 5,
            power_up_chance_base: 0.08,
            power_up_chance_per_level: 0.01,
            power_up_chance_max: 0.20,
            fire_cooldown: 15.0,
        }
    }
}

/// Balance values for the racer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RacerTuning {
    /// Lateral steering speed (px/frame)
    pub steer_speed: f32,
    pub min_speed_base: f32,
    pub min_speed_per_level: f32,
    pub max_speed_base: f32,
    pub max_speed_per_level: f32,
    /// Speed change per frame while accelerating/braking
    pub acceleration: f32,
    /// How fast a burst above the band bleeds off (px/frame²)
    pub burst_decay: f32,
    /// Enemy vehicle cruise speed as a fraction of the band minimum
    pub traffic_cruise_factor: f32,
    /// Vertical spacing between traffic rows
    pub row_spacing: f32,
    pub rows_per_wave: usize,
    pub max_hit_points: u32,
    pub power_up_chance_base: f64,
    pub power_up_chance_per_level: f64,
    pub power_up_chance_max: f64,
    /// Chance per lane slot of a row holding a vehicle
    pub lane_fill_chance: f64,
    /// Chance that a wave also releases a rival car
    pub rival_chance: f64,
    pub rival_lateral_speed: f32,
    pub rival_spin: f32,
    pub level_distance_base: f32,
    pub level_distance_per_level: f32,
    pub invulnerable_frames: f32,
    pub fire_cooldown: f32,
}

impl Default for RacerTuning {
    fn default() -> Self {
        Self {
            steer_speed: 6.0,
            min_speed_base: 4.0,
            min_speed_per_level: 0.5,
            max_speed_base: 9.0,
            max_speed_per_level: 0.75,
            acceleration: 0.15,
            burst_decay: 0.05,
            traffic_cruise_factor: 0.5,
            row_spacing: 180.0,
            rows_per_wave: 3,
            max_hit_points: 4,
            power_up_chance_base: 0.10,
            power_up_chance_per_level: 0.01,
            power_up_chance_max: 0.25,
            lane_fill_chance: 0.45,
            rival_chance: 0.35,
            rival_lateral_speed: 1.5,
            rival_spin: 2.0,
            level_distance_base: 6000.0,
            level_distance_per_level: 1500.0,
            invulnerable_frames: 90.0,
            fire_cooldown: 20.0,
        }
    }
}

/// Balance values shared by both games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub bricks: BrickTuning,
    pub racer: RacerTuning,
    /// Points per obstacle hit (scaled by level)
    pub base_score: u64,
    /// Bonus points per obstacle destroyed (scaled by level)
    pub destroy_score: u64,
    /// Points per enemy vehicle overtaken (scaled by level)
    pub pass_score: u64,
    pub particle_count: usize,
    pub particle_life: f32,
    pub particle_speed_min: f32,
    pub particle_speed_max: f32,
    /// Collectible fall rate (px/frame)
    pub collectible_fall_speed: f32,
    /// Pickup distance from the paddle bounding box
    pub pickup_radius: f32,
    pub projectile_speed: f32,
    /// Frames spent in the level-complete phase before advancing
    pub level_complete_delay: f32,
    pub expand_factor: f32,
    pub slow_factor: f32,
    pub speed_burst: f32,
    pub multi_ball_spread: f32,
    pub expand_duration: f32,
    pub slow_duration: f32,
    pub laser_duration: f32,
    pub shield_duration: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bricks: BrickTuning::default(),
            racer: RacerTuning::default(),
            base_score: 10,
            destroy_score: 50,
            pass_score: 5,
            particle_count: 8,
            particle_life: 30.0,
            particle_speed_min: 1.0,
            particle_speed_max: 3.0,
            collectible_fall_speed: 2.5,
            pickup_radius: 20.0,
            projectile_speed: 10.0,
            level_complete_delay: 120.0,
            expand_factor: 1.5,
            slow_factor: 0.6,
            speed_burst: 3.0,
            multi_ball_spread: 0.4,
            expand_duration: 600.0,
            slow_duration: 480.0,
            laser_duration: 600.0,
            shield_duration: 480.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid tuning JSON")
    }

    /// Load tuning from a file, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|json| Self::from_json(&json));
        match loaded {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "base_score": 20, "bricks": { "max_rows": 6 } }"#)
            .unwrap();
        assert_eq!(tuning.base_score, 20);
        assert_eq!(tuning.bricks.max_rows, 6);
        assert_eq!(tuning.destroy_score, 50);
        assert_eq!(tuning.racer, RacerTuning::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Tuning::from_json("{ not json").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let tuning = Tuning::load(&dir.path().join("missing.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
