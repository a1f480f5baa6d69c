//! Utility functions for the simulation

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique player ID
pub fn generate_player_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique game ID
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: f64, rating2: f64) -> f64 {
    (rating1 - rating2).abs()
}

/// Check if two ratings are strictly closer than the given tolerance
pub fn ratings_within_tolerance(rating1: f64, rating2: f64, tolerance: f64) -> bool {
    rating_difference(rating1, rating2) < tolerance
}
