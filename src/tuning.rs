//! Data-driven game balance
//!
//! Every gameplay constant lives here so rounds can be tuned (or themed)
//! without touching simulation code. The whole struct serializes with the
//! round snapshot, keeping restored rounds on the same balance they started
//! with.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::SlotGrid;

/// Gameplay balance for one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    // === Round ===
    /// Round length in seconds
    pub round_duration: f32,
    /// Lives at round start (also the restore cap for the boss mercy rule)
    pub max_lives: u8,

    // === Spawning ===
    /// Base seconds between regular spawns (divided by the difficulty multiplier)
    pub spawn_base_interval: f32,
    /// Floor for the scaled spawn interval
    pub spawn_min_interval: f32,
    /// Maximum simultaneously active moles
    pub concurrency_cap: usize,
    /// Seconds between guaranteed boss encounters
    pub boss_interval: f32,
    /// Retry delay when a forced boss spawn finds no room
    pub boss_retry_delay: f32,
    /// Probability the kind draw yields a bomb
    pub bomb_chance: f32,
    /// Probability the kind draw yields a boss (when none is active)
    pub boss_chance: f32,
    /// Hits required to fell a boss
    pub boss_max_hp: u32,

    // === Difficulty curve ===
    /// Multiplier at round start
    pub difficulty_base: f32,
    /// Added on top of the base once the round is fully ramped
    pub difficulty_ramp: f32,

    // === State durations (seconds at multiplier 1) ===
    /// Surfacing animation
    pub spawn_duration: f32,
    /// How long an angry mole dwells before escaping
    pub angry_dwell: f32,
    /// Windup between a scored hit and the attack
    pub preattack_delay: f32,
    /// Attack swing; the dodge check lands when it completes
    pub attack_duration: f32,
    /// Burrow-away animation
    pub leave_duration: f32,
    /// Bomb-planting animation
    pub plant_duration: f32,
    /// Fuse on an armed bomb
    pub bomb_fuse: f32,
    /// Defused-bomb fizzle
    pub defuse_duration: f32,
    /// Boss entrance; the mercy rule applies until it ends
    pub boss_intro_duration: f32,
    /// Knocked-out animation
    pub hit_duration: f32,

    // === Slot grid ===
    /// Hole columns
    pub grid_cols: usize,
    /// Hole rows
    pub grid_rows: usize,
    /// Center of the first hole in simulation space
    pub grid_origin: Vec2,
    /// Center-to-center hole spacing
    pub grid_spacing: f32,
    /// Press-detection radius around each hole center
    pub hole_radius: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Round
            round_duration: 60.0,
            max_lives: 3,

            // Spawning
            spawn_base_interval: 1.4,
            spawn_min_interval: 0.4,
            concurrency_cap: 4,
            boss_interval: 18.0,
            boss_retry_delay: 1.5,
            bomb_chance: 0.18,
            boss_chance: 0.07,
            boss_max_hp: 3,

            // Difficulty
            difficulty_base: 1.0,
            difficulty_ramp: 1.0,

            // Durations
            spawn_duration: 0.35,
            angry_dwell: 1.6,
            preattack_delay: 0.7,
            attack_duration: 0.5,
            leave_duration: 0.3,
            plant_duration: 0.4,
            bomb_fuse: 2.5,
            defuse_duration: 0.3,
            boss_intro_duration: 1.1,
            hit_duration: 0.3,

            // Grid: classic 3x3 board
            grid_cols: 3,
            grid_rows: 3,
            grid_origin: Vec2::new(120.0, 120.0),
            grid_spacing: 180.0,
            hole_radius: 64.0,
        }
    }
}

impl Tuning {
    /// Build the fixed slot grid this balance describes
    pub fn slot_grid(&self) -> SlotGrid {
        SlotGrid::layout(
            self.grid_cols,
            self.grid_rows,
            self.grid_origin,
            self.grid_spacing,
            self.hole_radius,
        )
    }

    /// A short round for soak tests and demos
    pub fn quick_round() -> Self {
        Self {
            round_duration: 20.0,
            boss_interval: 8.0,
            ..Self::default()
        }
    }
}
