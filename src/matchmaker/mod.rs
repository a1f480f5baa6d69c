//! Matchmaking queue, waiting slots and the resolution loop
//!
//! The matchmaker pairs queued players using a widening tolerance and a
//! fixed set of waiting slots, then resolves each match as a single contest.

pub mod engine;
pub mod slots;

// Re-export commonly used types
pub use engine::{GameRecord, Matchmaker, MatchmakerStats, Resolution};
pub use slots::{WaitingSlots, SLOT_CAPACITY};
