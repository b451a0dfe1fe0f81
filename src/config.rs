//! Game and level configuration
//!
//! Plain serde structs with defaults tuned to the classic variant: the
//! presentation layer may load overrides from JSON. Difficulty scaling across
//! levels is a configuration concern, expressed here as monotonic per-level
//! curves, not a core invariant.

use serde::{Deserialize, Serialize};

use crate::sim::PickupEffect;

/// Pursuit controller tuning shared by all pursuers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PursuitTuning {
    /// Manhattan radius inside which a pursuer flees the protector
    pub safe_distance: i32,
    /// Recompute timer band, seconds; each pursuer draws independently
    pub recompute_min: f32,
    pub recompute_max: f32,
    /// Depth cap for the cornered-flee BFS
    pub flee_search_depth: u32,
}

impl Default for PursuitTuning {
    fn default() -> Self {
        Self {
            safe_distance: 6,
            recompute_min: 0.35,
            recompute_max: 0.9,
            flee_search_depth: 6,
        }
    }
}

/// Per-level difficulty deltas; every curve is monotonic and capped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyScaling {
    /// Tiles added to each grid axis per level
    pub grid_step: i32,
    pub grid_width_max: i32,
    pub grid_height_max: i32,
    /// A pursuer is added every this many levels
    pub levels_per_pursuer: u32,
    pub pursuer_max: u32,
    /// Pursuer speed ratio gained per level
    pub ratio_step: f32,
    pub ratio_max: f32,
    /// Pickups removed per level
    pub pickup_step: u32,
    pub pickup_min: u32,
}

impl Default for DifficultyScaling {
    fn default() -> Self {
        Self {
            grid_step: 2,
            grid_width_max: 59,
            grid_height_max: 35,
            levels_per_pursuer: 2,
            pursuer_max: 4,
            ratio_step: 0.03,
            ratio_max: 0.7,
            pickup_step: 1,
            pickup_min: 2,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Level-0 maze dimensions (coerced to odd >= 5 by the generator)
    pub grid_width: i32,
    pub grid_height: i32,

    /// Runner base speed, tiles per second
    pub runner_speed: f32,
    /// Pursuer speed as a fraction of the runner's current speed
    pub pursuer_ratio: f32,
    /// Pursuer speed never drops below this, tiles per second
    pub pursuer_speed_floor: f32,
    /// Level-0 pursuer count
    pub pursuer_count: u32,

    /// Lives before the run ends; single-life by default
    pub lives: u32,
    /// Input/logic freeze before play starts, seconds
    pub countdown_secs: f32,
    /// Pause on a catch before respawn, seconds
    pub caught_pause_secs: f32,
    /// Pause on a win before the next level, seconds
    pub won_pause_secs: f32,

    /// Continuous catch threshold as a fraction of one tile width
    pub catch_radius: f32,
    /// Spawn separation is `max(width, height)` divided by this
    pub spawn_separation_divisor: i32,

    /// Level-0 pickup count
    pub pickup_count: u32,
    /// Effect applied by every pickup
    pub pickup_effect: PickupEffect,
    /// Score awarded per pickup
    pub pickup_points: u64,
    /// Pursuers flee the runner while a boost is active
    pub flee_while_boosted: bool,

    #[serde(default)]
    pub pursuit: PursuitTuning,
    #[serde(default)]
    pub scaling: DifficultyScaling,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 29,
            grid_height: 21,
            runner_speed: 6.0,
            pursuer_ratio: 0.45,
            pursuer_speed_floor: 1.0,
            pursuer_count: 1,
            lives: 1,
            countdown_secs: 1.5,
            caught_pause_secs: 1.0,
            won_pause_secs: 1.0,
            catch_radius: 0.35,
            spawn_separation_divisor: 4,
            pickup_count: 6,
            pickup_effect: PickupEffect {
                multiplier: 1.6,
                duration: 5.0,
            },
            pickup_points: 10,
            flee_while_boosted: true,
            pursuit: PursuitTuning::default(),
            scaling: DifficultyScaling::default(),
        }
    }
}

impl GameConfig {
    /// Maze dimensions for a given level index
    pub fn grid_for_level(&self, level: u32) -> (i32, i32) {
        let grow = self.scaling.grid_step * level as i32;
        (
            (self.grid_width + grow).min(self.scaling.grid_width_max),
            (self.grid_height + grow).min(self.scaling.grid_height_max),
        )
    }

    /// Pursuer count for a given level index
    pub fn pursuers_for_level(&self, level: u32) -> u32 {
        let extra = if self.scaling.levels_per_pursuer == 0 {
            0
        } else {
            level / self.scaling.levels_per_pursuer
        };
        (self.pursuer_count + extra).min(self.scaling.pursuer_max)
    }

    /// Pursuer speed ratio for a given level index
    pub fn ratio_for_level(&self, level: u32) -> f32 {
        (self.pursuer_ratio + self.scaling.ratio_step * level as f32).min(self.scaling.ratio_max)
    }

    /// Pickup count for a given level index
    pub fn pickups_for_level(&self, level: u32) -> u32 {
        self.pickup_count
            .saturating_sub(self.scaling.pickup_step * level)
            .max(self.scaling.pickup_min)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_is_monotonic_and_capped() {
        let config = GameConfig::default();
        let mut last = (0, 0);
        let mut last_pursuers = 0;
        let mut last_ratio = 0.0f32;
        let mut last_pickups = u32::MAX;
        for level in 0..40 {
            let grid = config.grid_for_level(level);
            assert!(grid.0 >= last.0 && grid.1 >= last.1);
            assert!(grid.0 <= config.scaling.grid_width_max);
            assert!(grid.1 <= config.scaling.grid_height_max);
            last = grid;

            let pursuers = config.pursuers_for_level(level);
            assert!(pursuers >= last_pursuers && pursuers <= config.scaling.pursuer_max);
            last_pursuers = pursuers;

            let ratio = config.ratio_for_level(level);
            assert!(ratio >= last_ratio && ratio <= config.scaling.ratio_max);
            last_ratio = ratio;

            let pickups = config.pickups_for_level(level);
            assert!(pickups <= last_pickups && pickups >= config.scaling.pickup_min);
            last_pickups = pickups;
        }
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig {
            pursuer_count: 3,
            lives: 2,
            ..GameConfig::default()
        };
        let json = config.to_json().unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed.pursuer_count, 3);
        assert_eq!(parsed.lives, 2);
        assert_eq!(parsed.grid_width, config.grid_width);
    }

    #[test]
    fn test_partial_json_uses_nested_defaults() {
        let json = r#"{
            "grid_width": 15, "grid_height": 11,
            "runner_speed": 5.0, "pursuer_ratio": 0.5, "pursuer_speed_floor": 1.0,
            "pursuer_count": 2, "lives": 3,
            "countdown_secs": 1.0, "caught_pause_secs": 1.0, "won_pause_secs": 1.0,
            "catch_radius": 0.35, "spawn_separation_divisor": 4,
            "pickup_count": 4, "pickup_effect": {"multiplier": 1.5, "duration": 4.0},
            "pickup_points": 10, "flee_while_boosted": false
        }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.pursuit.safe_distance, PursuitTuning::default().safe_distance);
        assert_eq!(config.scaling.pickup_min, DifficultyScaling::default().pickup_min);
    }
}
