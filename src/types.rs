//! Common types used throughout the simulation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = Uuid;

/// Unique identifier for resolved games
pub type GameId = Uuid;

/// Lifecycle of a player actor
///
/// `Queued` covers both a pending request in the queue and a parked spot in
/// the waiting slots. There is no transition out of `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    Idle,
    Queued,
    Terminated,
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorState::Idle => write!(f, "Idle"),
            ActorState::Queued => write!(f, "Queued"),
            ActorState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Which tier of the resolution policy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchTier {
    /// A waiting player was within tolerance
    Instant,
    /// Every slot was full, so the closest waiting player was taken
    Forced,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTier::Instant => write!(f, "Instant"),
            MatchTier::Forced => write!(f, "Forced"),
        }
    }
}

/// Point-in-time view of a player, used in reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub rating: f64,
    pub willingness: f64,
    pub games_played: u32,
    pub state: ActorState,
}
