//! ELO Queue - self-adjusting rating matchmaking simulation
//!
//! Independent player actors decide at random whether to queue; a single
//! matchmaker drains the queue, pairs players with a widening tolerance and
//! a fixed set of waiting slots, and resolves every match as one contest
//! whose outcome updates both ratings through a damped ELO rule.

pub mod config;
pub mod error;
pub mod matchmaker;
pub mod player;
pub mod random;
pub mod rating;
pub mod simulation;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, SimulationError};
pub use types::*;

// Re-export key components
pub use matchmaker::{Matchmaker, Resolution};
pub use player::{Player, PlayerActor};
pub use random::RandomSource;
pub use simulation::{Simulation, SimulationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
