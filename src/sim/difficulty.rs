//! Difficulty curve
//!
//! A pure function of elapsed round time. The multiplier compresses every
//! entity timer and divides the spawn interval, so the whole round speeds
//! up on one knob.

use crate::tuning::Tuning;

/// Speed multiplier at a given point in the round: ramps linearly from
/// `difficulty_base` to `difficulty_base + difficulty_ramp` over the round,
/// then holds.
#[inline]
pub fn multiplier(elapsed: f32, tuning: &Tuning) -> f32 {
    let progress = (elapsed / tuning.round_duration).clamp(0.0, 1.0);
    tuning.difficulty_base + progress * tuning.difficulty_ramp
}

/// Regular spawn interval at a given speed, floored so late-round spawning
/// stays sane.
#[inline]
pub fn spawn_interval(speed: f32, tuning: &Tuning) -> f32 {
    (tuning.spawn_base_interval / speed).max(tuning.spawn_min_interval)
}
