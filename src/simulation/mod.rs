//! Simulation driver and reporting
//!
//! This module wires a matchmaker and its player actors into a complete run
//! and summarizes the resulting ratings.

pub mod report;
pub mod runner;

pub use report::{RatingSummary, SimulationReport};
pub use runner::Simulation;
