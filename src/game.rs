//! Host-facing game shell
//!
//! Owns the round state and the fixed-timestep accumulator, queues raw
//! pointer input between frames, and delivers the completion callback
//! exactly once. The shell never mutates simulation state directly; it only
//! decides when `tick` runs, which is what makes stop/pause structurally
//! safe: a suspended round is simply never ticked.

use glam::Vec2;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sim::{RoundEvent, RoundPhase, RoundState, TickInput, tick};
use crate::tuning::Tuning;

/// Invoked once per round with the final score
pub type CompletionCallback = Box<dyn FnMut(u64)>;

/// One playable round and its host plumbing
pub struct Game {
    state: RoundState,
    accumulator: f32,
    input: TickInput,
    running: bool,
    paused: bool,
    completed: bool,
    on_complete: Option<CompletionCallback>,
}

impl Game {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            state: RoundState::new(seed, tuning),
            accumulator: 0.0,
            input: TickInput::default(),
            running: false,
            paused: false,
            completed: false,
            on_complete: None,
        }
    }

    /// Register the end-of-round callback
    pub fn set_on_complete(&mut self, callback: impl FnMut(u64) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Begin ticking; a no-op if the round is already running
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.paused = false;
        log::info!("round started (seed {})", self.state.seed);
    }

    /// Halt ticking and stop accepting input. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.paused = false;
        self.input = TickInput {
            autoplay: self.input.autoplay,
            ..Default::default()
        };
        log::info!("round stopped at {:.1}s", self.state.elapsed);
    }

    /// Suspend ticking without resetting anything
    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    /// Pick up where pause left off
    pub fn resume(&mut self) {
        if self.running {
            self.paused = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Queue a press in simulation coordinates; it resolves at the start of
    /// the next tick, never inside the caller's stack
    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        if !self.running || self.state.phase == RoundPhase::Ended {
            return;
        }
        self.input.presses.push(Vec2::new(x, y));
    }

    /// Track the pointer; completed attacks check this position
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if !self.running {
            return;
        }
        self.input.cursor = Some(Vec2::new(x, y));
    }

    /// Toggle the self-playing demo mode
    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.input.autoplay = autoplay;
    }

    /// Advance by one rendered frame's worth of real time. Runs zero or
    /// more fixed-size simulation ticks.
    pub fn frame(&mut self, dt: f32) {
        if !self.running || self.paused {
            return;
        }

        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Presses are one-shot; the first tick consumed them
            self.input.presses.clear();
        }

        if self.state.phase == RoundPhase::Ended && !self.completed {
            self.completed = true;
            let score = self.state.ledger.score;
            if let Some(callback) = self.on_complete.as_mut() {
                callback(score);
            }
        }
    }

    /// Read-only view of the round for rendering
    pub fn snapshot(&self) -> &RoundState {
        &self.state
    }

    /// Take everything that happened since the last drain
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Throw the round away and rack up a fresh one on the same balance
    pub fn restart(&mut self, seed: u64) {
        self.state = RoundState::new(seed, self.state.tuning.clone());
        self.accumulator = 0.0;
        self.input = TickInput {
            autoplay: self.input.autoplay,
            ..Default::default()
        };
        self.completed = false;
    }
}
