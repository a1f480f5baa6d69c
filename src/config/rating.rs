//! Rating and actor behavior configuration

use crate::player::{BASELINE_RATING, MAX_WILLINGNESS, MIN_WILLINGNESS};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating every new player starts with
    pub baseline_rating: f64,
    /// Lower bound (inclusive) of a player's willingness to play
    pub min_willingness: f64,
    /// Upper bound (exclusive) of a player's willingness to play
    pub max_willingness: f64,
    /// Consecutive declines before an actor leaves
    pub idle_limit: u32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            baseline_rating: BASELINE_RATING,
            min_willingness: MIN_WILLINGNESS,
            max_willingness: MAX_WILLINGNESS,
            idle_limit: 3,
        }
    }
}

impl RatingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.baseline_rating.is_finite() {
            return Err(anyhow!("Baseline rating must be finite"));
        }
        if !(0.0..=1.0).contains(&self.min_willingness)
            || !(0.0..=1.0).contains(&self.max_willingness)
        {
            return Err(anyhow!("Willingness bounds must lie in [0, 1]"));
        }
        if self.min_willingness > self.max_willingness {
            return Err(anyhow!(
                "Willingness range is inverted: {} > {}",
                self.min_willingness,
                self.max_willingness
            ));
        }
        if self.idle_limit == 0 {
            return Err(anyhow!("Idle limit must be at least 1"));
        }
        Ok(())
    }
}
