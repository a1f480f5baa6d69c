//! Final report for a simulation run

use crate::matchmaker::MatchmakerStats;
use crate::types::{ActorState, PlayerSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything observable at the end of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Whether every actor reached `Terminated` before the run ended
    pub completed: bool,
    pub players: Vec<PlayerSnapshot>,
    pub damper: f64,
    /// Sum of ratings of players that have not terminated
    pub active_rating: f64,
    /// Sum of ratings at the start of the run
    pub initial_rating: f64,
    pub stats: MatchmakerStats,
}

/// Aggregate view of the final ratings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub players: usize,
    pub terminated: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl SimulationReport {
    /// Rating summary over all players
    pub fn summary(&self) -> RatingSummary {
        if self.players.is_empty() {
            return RatingSummary::default();
        }

        let count = self.players.len() as f64;
        let ratings = self.players.iter().map(|p| p.rating);
        let mean = ratings.clone().sum::<f64>() / count;
        let variance = ratings.clone().map(|r| (r - mean).powi(2)).sum::<f64>() / count;

        RatingSummary {
            players: self.players.len(),
            terminated: self
                .players
                .iter()
                .filter(|p| p.state == ActorState::Terminated)
                .count(),
            mean,
            min: ratings.clone().fold(f64::INFINITY, f64::min),
            max: ratings.fold(f64::NEG_INFINITY, f64::max),
            std_dev: variance.sqrt(),
        }
    }

    /// Drift of `active_rating - damper` from the starting total
    ///
    /// Contests move rating and damper together and departures move the
    /// departing rating into the damper, so this stays at zero up to
    /// floating point error.
    pub fn ledger_drift(&self) -> f64 {
        self.active_rating - self.damper - self.initial_rating
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{current_timestamp, generate_player_id};

    fn snapshot(rating: f64, state: ActorState) -> PlayerSnapshot {
        PlayerSnapshot {
            id: generate_player_id(),
            rating,
            willingness: 0.5,
            games_played: 1,
            state,
        }
    }

    fn report(players: Vec<PlayerSnapshot>) -> SimulationReport {
        SimulationReport {
            started_at: current_timestamp(),
            elapsed_ms: 10,
            completed: true,
            players,
            damper: -4.0,
            active_rating: -4.0,
            initial_rating: 0.0,
            stats: MatchmakerStats::default(),
        }
    }

    #[test]
    fn test_summary() {
        let report = report(vec![
            snapshot(5.0, ActorState::Terminated),
            snapshot(-5.0, ActorState::Terminated),
            snapshot(3.0, ActorState::Idle),
        ]);
        let summary = report.summary();

        assert_eq!(summary.players, 3);
        assert_eq!(summary.terminated, 2);
        assert!((summary.mean - 1.0).abs() < 1e-12);
        assert_eq!(summary.min, -5.0);
        assert_eq!(summary.max, 5.0);
        assert!(summary.std_dev > 0.0);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(report(vec![]).summary(), RatingSummary::default());
    }

    #[test]
    fn test_ledger_drift_and_json() {
        let report = report(vec![snapshot(1.0, ActorState::Idle)]);
        assert_eq!(report.ledger_drift(), 0.0);

        let json = report.to_json().unwrap();
        let parsed: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.players.len(), 1);
        assert_eq!(parsed.damper, -4.0);
    }
}
