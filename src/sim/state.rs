//! Round state and core simulation types
//!
//! Everything gameplay-authoritative lives here and serializes, so a
//! snapshot restored mid-round continues identically to the uninterrupted
//! round.

use serde::{Deserialize, Serialize};

use super::grid::SlotGrid;
use super::ledger::Ledger;
use super::spawn::SpawnClock;
use crate::consts::{BASE_POINTS, BOSS_POINTS};
use crate::tuning::Tuning;

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Round is ticking
    Active,
    /// Terminal; nothing mutates after entry
    Ended,
}

/// What kind of mole occupies a hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoleKind {
    /// Surfaces, idles, dives; worth base points
    Regular,
    /// Scores when struck but still swings back
    Angry,
    /// Plants a bomb that must be defused before its fuse runs out
    Bomb,
    /// Multi-hit; doubles all player damage while in combat
    Boss,
}

impl MoleKind {
    /// First state after the surfacing animation completes
    pub fn next_state_after_spawn(self) -> MoleState {
        match self {
            MoleKind::Regular => MoleState::Leaving,
            MoleKind::Angry => MoleState::Angry,
            MoleKind::Bomb => MoleState::LeavingBomb,
            MoleKind::Boss => MoleState::BossIntro,
        }
    }

    /// Reward banked when this kind is successfully struck
    #[inline]
    pub fn base_points(self) -> u64 {
        match self {
            MoleKind::Boss => BOSS_POINTS,
            _ => BASE_POINTS,
        }
    }
}

/// Per-entity state machine tags (closed set; transitions live in `tick`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoleState {
    /// Surfacing / idling in the hole
    Spawning,
    /// Dwelling, about to escape unharmed
    Angry,
    /// Windup after a scored hit
    PreAttack,
    /// Swing in flight; dodge check lands when it completes
    Attacking,
    /// Diving back down, no longer hittable
    Leaving,
    /// Planting a bomb on the way out
    LeavingBomb,
    /// Armed bomb on a fuse
    Bomb,
    /// Defused bomb fizzling out
    Defused,
    /// Boss entrance; mercy rule applies
    BossIntro,
    /// Boss in combat, held while it has hit points
    BossActive,
    /// Knocked out by a strike
    Hit,
    /// Terminal; removed from the pool
    Gone,
}

/// A mole entity, owned exclusively by the round's pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mole {
    pub id: u32,
    /// Slot this mole occupies; unique among active moles
    pub hole: usize,
    pub kind: MoleKind,
    pub state: MoleState,
    /// Transition target fixed at spawn time, entered when Spawning ends
    pub next_state: MoleState,
    /// Animation progress counter, not gameplay-authoritative
    pub frame: u32,
    /// Seconds in the current state (difficulty-scaled)
    pub state_timer: f32,
    /// Seconds since entering PreAttack; angry kind only
    pub attack_timer: f32,
    /// Remaining hit points (1 for everything but bosses)
    pub hp: u32,
    pub max_hp: u32,
    /// A hit rewards exactly once per lifetime
    pub reward_granted: bool,
}

impl Mole {
    pub fn new(id: u32, hole: usize, kind: MoleKind, hp: u32) -> Self {
        Self {
            id,
            hole,
            kind,
            state: MoleState::Spawning,
            next_state: kind.next_state_after_spawn(),
            frame: 0,
            state_timer: 0.0,
            attack_timer: 0.0,
            hp,
            max_hp: hp,
            reward_granted: false,
        }
    }

    /// Enter a new state, resetting the state clock
    pub fn enter(&mut self, state: MoleState) {
        self.state = state;
        self.state_timer = 0.0;
        if state == MoleState::PreAttack {
            self.attack_timer = 0.0;
        }
    }

    /// Whether a press can currently connect with this mole
    pub fn is_hittable(&self) -> bool {
        !matches!(
            self.state,
            MoleState::Leaving | MoleState::Defused | MoleState::Hit | MoleState::Gone
        )
    }

    /// How long the current state lasts at multiplier 1; `None` for states
    /// held until an external event (a boss stays up until felled)
    pub fn state_duration(&self, tuning: &Tuning) -> Option<f32> {
        let secs = match self.state {
            // A regular mole idles in its hole for the dwell before diving
            MoleState::Spawning if self.kind == MoleKind::Regular => {
                tuning.spawn_duration + tuning.angry_dwell
            }
            MoleState::Spawning => tuning.spawn_duration,
            MoleState::Angry => tuning.angry_dwell,
            MoleState::PreAttack => tuning.preattack_delay,
            MoleState::Attacking => tuning.attack_duration,
            MoleState::Leaving => tuning.leave_duration,
            MoleState::LeavingBomb => tuning.plant_duration,
            MoleState::Bomb => tuning.bomb_fuse,
            MoleState::Defused => tuning.defuse_duration,
            MoleState::BossIntro => tuning.boss_intro_duration,
            MoleState::Hit => tuning.hit_duration,
            MoleState::BossActive | MoleState::Gone => return None,
        };
        Some(secs)
    }
}

/// Things that happened during a tick, drained by the presentation adapter
/// for sound and flourish. Not part of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundEvent {
    MoleWhacked { hole: usize, kind: MoleKind, points: u64 },
    BombDefused { hole: usize, points: u64 },
    BombExploded { hole: usize },
    BossSpared { hole: usize },
    BossFelled { hole: usize, points: u64 },
    LifeLost { remaining: u8 },
    ComboBroken { streak: u32 },
    RoundEnded { score: u64 },
}

/// Complete round state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    /// Round seed for reproducibility
    pub seed: u64,
    /// Balance this round was started with
    pub tuning: Tuning,
    pub phase: RoundPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Seconds since round start
    pub elapsed: f32,
    /// Countdown to round end
    pub time_remaining: f32,
    /// Score, combo, lives, boss aura
    pub ledger: Ledger,
    /// The fixed board
    pub grid: SlotGrid,
    /// Active moles (spawn order; ids are monotonic)
    pub moles: Vec<Mole>,
    /// Spawn scheduler countdowns and draw counter
    pub spawn_clock: SpawnClock,
    /// Input-feedback flash, decays each tick (cosmetic)
    pub feedback_flash: f32,
    /// Per-tick event log, drained by the host
    #[serde(skip)]
    pub events: Vec<RoundEvent>,
    /// Next entity ID
    next_id: u32,
}

impl RoundState {
    /// Create a fresh round with the given seed and balance
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            phase: RoundPhase::Active,
            time_ticks: 0,
            elapsed: 0.0,
            time_remaining: tuning.round_duration,
            ledger: Ledger::new(tuning.max_lives),
            grid: tuning.slot_grid(),
            moles: Vec::new(),
            spawn_clock: SpawnClock::new(&tuning),
            feedback_flash: 0.0,
            events: Vec::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Put a mole of the given kind into a specific slot. The caller is
    /// responsible for picking a free slot; bosses flip the aura on the
    /// moment they are created, not when their intro finishes.
    pub fn spawn_mole(&mut self, kind: MoleKind, hole: usize) -> u32 {
        let hp = match kind {
            MoleKind::Boss => self.tuning.boss_max_hp,
            _ => 1,
        };
        let id = self.next_entity_id();
        self.moles.push(Mole::new(id, hole, kind, hp));
        if kind == MoleKind::Boss {
            self.ledger.boss_active = true;
        }
        log::debug!("spawned {kind:?} in hole {hole} (id {id})");
        id
    }

    /// Whether any boss entity is still in the pool
    pub fn boss_present(&self) -> bool {
        self.moles.iter().any(|m| m.kind == MoleKind::Boss)
    }

    /// Slots not currently occupied by any active mole
    pub fn free_slots(&self) -> Vec<usize> {
        (0..self.grid.len())
            .filter(|&slot| !self.moles.iter().any(|m| m.hole == slot))
            .collect()
    }

    /// The hittable mole in a slot, most recently spawned first
    pub fn hittable_at(&self, slot: usize) -> Option<usize> {
        self.moles
            .iter()
            .enumerate()
            .filter(|(_, m)| m.hole == slot && m.is_hittable())
            .max_by_key(|(_, m)| m.id)
            .map(|(i, _)| i)
    }

    pub fn push_event(&mut self, event: RoundEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_chain_targets() {
        assert_eq!(
            MoleKind::Angry.next_state_after_spawn(),
            MoleState::Angry
        );
        assert_eq!(
            MoleKind::Bomb.next_state_after_spawn(),
            MoleState::LeavingBomb
        );
        assert_eq!(
            MoleKind::Boss.next_state_after_spawn(),
            MoleState::BossIntro
        );
        assert_eq!(
            MoleKind::Regular.next_state_after_spawn(),
            MoleState::Leaving
        );
    }

    #[test]
    fn test_boss_aura_set_at_creation() {
        let mut state = RoundState::new(7, Tuning::default());
        assert!(!state.ledger.boss_active);
        state.spawn_mole(MoleKind::Boss, 0);
        // Aura is on while the boss is still in its spawn animation
        assert!(state.ledger.boss_active);
        assert_eq!(state.moles[0].state, MoleState::Spawning);
    }

    #[test]
    fn test_hittable_tiebreak_most_recent() {
        let mut state = RoundState::new(7, Tuning::default());
        let first = state.spawn_mole(MoleKind::Angry, 2);
        // Defensive slot sharing: a second occupant in the same hole
        let second = state.spawn_mole(MoleKind::Regular, 2);
        assert!(second > first);
        let idx = state.hittable_at(2).unwrap();
        assert_eq!(state.moles[idx].id, second);
    }

    #[test]
    fn test_free_slots_excludes_occupied() {
        let mut state = RoundState::new(7, Tuning::default());
        let total = state.grid.len();
        state.spawn_mole(MoleKind::Angry, 0);
        state.spawn_mole(MoleKind::Bomb, 3);
        let free = state.free_slots();
        assert_eq!(free.len(), total - 2);
        assert!(!free.contains(&0));
        assert!(!free.contains(&3));
    }
}
