//! Mole Rush - a whack-a-mole arcade round engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity state machines, spawning, scoring)
//! - `game`: Host-facing shell (start/stop/pause, input queue, fixed timestep)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Session leaderboard

pub mod game;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use highscores::HighScores;
pub use tuning::Tuning;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for responsive hit feedback)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Reward for whacking a boss
    pub const BOSS_POINTS: u64 = 100;
    /// Reward for whacking anything else
    pub const BASE_POINTS: u64 = 10;

    /// Combo streak at which the reward multiplier doubles
    pub const COMBO_TIER_2: u32 = 5;
    /// Combo streak at which the reward multiplier triples
    pub const COMBO_TIER_3: u32 = 10;
}
