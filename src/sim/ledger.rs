//! Combo and scoring ledger
//!
//! Score, combo streak and lives are only ever mutated through the
//! operations here, so the scoring rules (combo tiers, boss damage aura,
//! life clamping) live in exactly one place.

use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_TIER_2, COMBO_TIER_3};

/// Global round counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Total score; never decreases
    pub score: u64,
    /// Consecutive successful-hit streak
    pub combo: u32,
    /// Remaining lives, in [0, max_lives]
    pub lives: u8,
    /// Life cap (mercy rule restores up to this)
    pub max_lives: u8,
    /// While true, all damage to the player is doubled
    pub boss_active: bool,
}

impl Ledger {
    pub fn new(max_lives: u8) -> Self {
        Self {
            score: 0,
            combo: 0,
            lives: max_lives,
            max_lives,
            boss_active: false,
        }
    }

    /// Reward multiplier for a given streak
    #[inline]
    pub fn multiplier(combo: u32) -> u64 {
        if combo >= COMBO_TIER_3 {
            3
        } else if combo >= COMBO_TIER_2 {
            2
        } else {
            1
        }
    }

    /// Bank a successful hit: advance the streak, then score the hit at the
    /// streak's tier. The hit that reaches a tier boundary already earns the
    /// new tier. Returns the points gained.
    pub fn grant(&mut self, base_points: u64) -> u64 {
        self.combo += 1;
        let gained = base_points * Self::multiplier(self.combo);
        self.score += gained;
        gained
    }

    /// Apply damage to the player, doubled while a boss is in combat.
    /// Returns the lives actually lost.
    pub fn apply_damage(&mut self, amount: u8) -> u8 {
        let amount = if self.boss_active { amount * 2 } else { amount };
        let lost = amount.min(self.lives);
        self.lives -= lost;
        lost
    }

    /// Break the streak. Returns the streak that was lost.
    pub fn reset_combo(&mut self) -> u32 {
        std::mem::take(&mut self.combo)
    }

    /// Give a life back, clamped at the cap (boss mercy rule)
    pub fn restore_life(&mut self) {
        self.lives = (self.lives + 1).min(self.max_lives);
    }
}
