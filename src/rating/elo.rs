//! Contest outcome and rating delta equations
//!
//! A contest between two players is a single weighted coin flip: the higher
//! rated side wins 60% of the time, equal ratings are a fair toss. The rating
//! exchanged shrinks as the winner's lead grows and grows for upsets, following
//! a cube-root curve clamped to `[MIN_DELTA, MAX_DELTA]`.

use crate::rating::damper::Damper;
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

/// Cap on the instant-match tolerance
pub const MAX_TOLERANCE: f64 = 20.0;

/// Tolerance growth per square root of queued requests
pub const TOLERANCE_SCALE: f64 = 1.1;

/// Smallest rating change a contest can award
pub const MIN_DELTA: f64 = 2.5;

/// Largest rating change a contest can award
pub const MAX_DELTA: f64 = 7.5;

/// Delta awarded for a contest between equal ratings
pub const BASE_DELTA: f64 = 5.0;

/// Steepness of the cube-root delta curve
pub const DELTA_SLOPE: f64 = 0.8;

/// Win probability of the higher rated player
pub const FAVORITE_WIN_CHANCE: f64 = 0.6;

/// Win probability of the lower rated player
pub const UNDERDOG_WIN_CHANCE: f64 = 0.4;

/// Maximum rating gap for an instant match, given the current queue length
///
/// Widens as the queue backs up so that a congested queue trades rating
/// fairness for throughput, and never exceeds [`MAX_TOLERANCE`].
pub fn tolerance(queue_len: usize) -> f64 {
    ((queue_len as f64).sqrt() * TOLERANCE_SCALE).min(MAX_TOLERANCE)
}

/// Rating change for a contest where the winner led by `gap`
///
/// `gap` is winner minus loser and is negative for an upset.
pub fn compute_delta(gap: f64) -> f64 {
    (-DELTA_SLOPE * gap.cbrt() + BASE_DELTA).clamp(MIN_DELTA, MAX_DELTA)
}

/// Decide whether the first player wins, given `diff = first - second` and a
/// uniform sample in `[0, 1)`
pub fn decide_outcome(diff: f64, sample: f64) -> bool {
    let threshold = if diff == 0.0 {
        0.5
    } else if diff > 0.0 {
        UNDERDOG_WIN_CHANCE
    } else {
        FAVORITE_WIN_CHANCE
    };
    sample >= threshold
}

/// Rating changes produced by one resolved contest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestOutcome {
    pub winner: PlayerId,
    pub loser: PlayerId,
    /// Winner minus loser, before the update
    pub gap: f64,
    /// Rating gained by the winner
    pub delta: f64,
    /// Rating lost by the loser, after damper correction
    pub loser_deduction: f64,
    pub damper_before: f64,
    pub damper_after: f64,
}

/// Compute the rating exchange for a decided contest
///
/// Mutates `damper` by the correction it hands to the loser; returns the
/// `(delta, loser_deduction)` pair to apply.
pub fn exchange(winner_rating: f64, loser_rating: f64, damper: &mut Damper) -> (f64, f64) {
    let delta = compute_delta(winner_rating - loser_rating);
    let deduction = damper.correct(delta);
    (delta, deduction)
}
