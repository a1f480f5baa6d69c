//! Rating system: contest outcomes, ELO deltas and the damper
//!
//! This module holds the pure rating arithmetic. The matchmaker owns the
//! damper instance and applies the results to players.

pub mod damper;
pub mod elo;

// Re-export commonly used types
pub use damper::{Damper, MAX_CORRECTION};
pub use elo::{compute_delta, decide_outcome, exchange, tolerance, ContestOutcome};
