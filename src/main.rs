//! Mole Rush entry point
//!
//! Headless demo: runs seeded autoplay rounds to completion and keeps a
//! session leaderboard. Rendering hosts embed `mole_rush::Game` instead.

use std::cell::RefCell;
use std::rc::Rc;

use mole_rush::consts::SIM_DT;
use mole_rush::sim::RoundEvent;
use mole_rush::{Game, HighScores, Tuning};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xC0FFEE);
    let rounds: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    log::info!("Mole Rush (headless): {rounds} autoplay round(s) from seed {seed}");

    let mut leaderboard = HighScores::new();

    for i in 0..rounds {
        let round_seed = seed.wrapping_add(i as u64);
        let final_score: Rc<RefCell<Option<u64>>> = Rc::default();

        let mut game = Game::new(round_seed, Tuning::quick_round());
        game.set_autoplay(true);
        let sink = Rc::clone(&final_score);
        game.set_on_complete(move |score| *sink.borrow_mut() = Some(score));
        game.start();

        let mut whacks = 0u32;
        let mut lives_lost = 0u32;
        while final_score.borrow().is_none() {
            game.frame(SIM_DT);
            for event in game.drain_events() {
                match event {
                    RoundEvent::MoleWhacked { .. }
                    | RoundEvent::BombDefused { .. }
                    | RoundEvent::BossFelled { .. } => whacks += 1,
                    RoundEvent::LifeLost { .. } => lives_lost += 1,
                    _ => {}
                }
            }
        }
        game.stop();

        let score = final_score.borrow().unwrap_or(0);
        let rank = leaderboard.add_score(score, round_seed);
        let placing = match rank {
            Some(r) => format!(", leaderboard #{r}"),
            None => String::new(),
        };
        log::info!(
            "round {} (seed {round_seed}): score {score}, {whacks} whacks, {lives_lost} lives lost{placing}",
            i + 1
        );
    }

    if let Some(top) = leaderboard.top_score() {
        log::info!("best round this session: {top}");
    }
}
