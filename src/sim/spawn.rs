//! Spawn scheduler
//!
//! Two independent countdowns: a regular spawn clock whose interval shrinks
//! with difficulty, and a boss clock guaranteeing periodic boss encounters.
//! Randomness comes from per-decision PCG streams seeded off the round seed
//! and a serialized draw counter, so a restored snapshot continues the
//! exact spawn sequence.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty;
use super::state::{MoleKind, RoundState};
use crate::tuning::Tuning;

/// Scheduler countdowns, part of the round snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnClock {
    /// Seconds until the next regular spawn attempt
    pub spawn_timer: f32,
    /// Seconds until the next guaranteed boss
    pub boss_timer: f32,
    /// Decisions taken so far; seeds the next PCG stream
    pub draws: u64,
}

impl SpawnClock {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            spawn_timer: tuning.spawn_base_interval,
            boss_timer: tuning.boss_interval,
            draws: 0,
        }
    }

    /// Fresh PCG stream for one scheduling decision
    fn next_rng(&mut self, seed: u64) -> Pcg32 {
        self.draws += 1;
        Pcg32::seed_from_u64(seed ^ self.draws.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Advance both countdowns by `dt` and introduce entities as they expire
pub fn run(state: &mut RoundState, speed: f32, dt: f32) {
    state.spawn_clock.spawn_timer -= dt;
    state.spawn_clock.boss_timer -= dt;

    // Boss clock fires regardless of the regular timer and of the kind draw
    if state.spawn_clock.boss_timer <= 0.0 {
        if !state.boss_present() && try_spawn(state, Some(MoleKind::Boss)) {
            state.spawn_clock.boss_timer = state.tuning.boss_interval;
        } else {
            // A boss is still up, or there was no room: retry shortly
            state.spawn_clock.boss_timer = state.tuning.boss_retry_delay;
        }
    }

    if state.spawn_clock.spawn_timer <= 0.0 {
        state.spawn_clock.spawn_timer = if try_spawn(state, None) {
            difficulty::spawn_interval(speed, &state.tuning)
        } else {
            // Board full: back off briefly instead of a full interval
            state.tuning.spawn_min_interval
        };
    }
}

/// Spawn one mole into a random free slot. `forced` skips the kind draw
/// (boss clock). Returns false when the cap or the board blocks it.
fn try_spawn(state: &mut RoundState, forced: Option<MoleKind>) -> bool {
    if state.moles.len() >= state.tuning.concurrency_cap {
        return false;
    }
    let free = state.free_slots();
    if free.is_empty() {
        return false;
    }

    let mut rng = state.spawn_clock.next_rng(state.seed);
    let kind = match forced {
        Some(kind) => kind,
        None => draw_kind(&mut rng, &state.tuning, !state.boss_present()),
    };
    let slot = free[rng.random_range(0..free.len())];
    state.spawn_mole(kind, slot);
    true
}

/// One uniform draw routed to bomb / boss / angry. A blocked boss roll
/// falls through to angry.
fn draw_kind(rng: &mut impl Rng, tuning: &Tuning, boss_allowed: bool) -> MoleKind {
    let roll: f32 = rng.random();
    if roll < tuning.bomb_chance {
        MoleKind::Bomb
    } else if boss_allowed && roll < tuning.bomb_chance + tuning.boss_chance {
        MoleKind::Boss
    } else {
        MoleKind::Angry
    }
}
