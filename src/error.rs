//! Error types for the matchmaking simulation
//!
//! There are no recoverable errors in normal operation. The variants below
//! describe programming errors and faulty inputs that are surfaced instead of
//! silently corrupting queue, slot or damper state.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific simulation failures
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Player submitted while already queued: {player_id}")]
    DuplicateSubmission { player_id: String },

    #[error("Forced match attempted with no occupied waiting slot")]
    NoOccupiedSlot,

    #[error("Random source produced a value outside [0, 1): {value}")]
    InvalidSample { value: f64 },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal simulation error: {message}")]
    InternalError { message: String },
}

impl SimulationError {
    /// Shorthand for a poisoned lock on the named piece of state
    pub fn lock_poisoned(what: &str) -> Self {
        SimulationError::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
