//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod difficulty;
pub mod grid;
pub mod ledger;
pub mod spawn;
pub mod state;
pub mod tick;

pub use grid::SlotGrid;
pub use ledger::Ledger;
pub use spawn::SpawnClock;
pub use state::{Mole, MoleKind, MoleState, RoundEvent, RoundPhase, RoundState};
pub use tick::{TickInput, tick};
