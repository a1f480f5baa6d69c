//! Player model and actor behavior
//!
//! A [`Player`] is the shared identity and rating that the matchmaker
//! mutates after each contest. A [`PlayerActor`] drives one player's
//! decision loop: queue up with probability equal to its willingness, and
//! leave the simulation after too many consecutive declines.

pub mod actor;

pub use actor::{ActorConfig, PlayerActor};

use crate::error::Result;
use crate::random::{checked_sample, RandomSource};
use crate::types::PlayerId;
use crate::utils::generate_player_id;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Baseline rating for new players
pub const BASELINE_RATING: f64 = 0.0;

/// Lower bound (inclusive) of a random willingness to play
pub const MIN_WILLINGNESS: f64 = 0.2;

/// Upper bound (exclusive) of a random willingness to play
pub const MAX_WILLINGNESS: f64 = 0.8;

/// A simulated player
#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    willingness: f64,
    rating: Mutex<f64>,
    games_played: AtomicU32,
}

impl Player {
    /// Create a player with a fresh id
    pub fn new(rating: f64, willingness: f64) -> Self {
        Self::with_id(generate_player_id(), rating, willingness)
    }

    pub fn with_id(id: PlayerId, rating: f64, willingness: f64) -> Self {
        Self {
            id,
            willingness,
            rating: Mutex::new(rating),
            games_played: AtomicU32::new(0),
        }
    }

    /// Create a player whose willingness is uniform in `[min, max)`
    pub fn with_random_willingness(
        rating: f64,
        min: f64,
        max: f64,
        source: &mut dyn RandomSource,
    ) -> Result<Self> {
        let willingness = min + checked_sample(source)? * (max - min);
        Ok(Self::new(rating, willingness))
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Probability of queueing on any given decision tick
    pub fn willingness(&self) -> f64 {
        self.willingness
    }

    pub fn rating(&self) -> f64 {
        // A plain f64 cannot be left half-written, so a poisoned lock is still usable.
        *self.rating.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `amount` to the rating (negative to deduct)
    pub fn adjust_rating(&self, amount: f64) {
        *self.rating.lock().unwrap_or_else(PoisonError::into_inner) += amount;
    }

    /// This player's rating minus `other`'s
    pub fn rating_diff(&self, other: &Player) -> f64 {
        self.rating() - other.rating()
    }

    pub fn games_played(&self) -> u32 {
        self.games_played.load(Ordering::Relaxed)
    }

    pub(crate) fn record_game(&self) {
        self.games_played.fetch_add(1, Ordering::Relaxed);
    }
}
