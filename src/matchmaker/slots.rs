//! Fixed-capacity waiting slots
//!
//! Players that were dequeued without finding an opponent park here. All
//! scans run in ascending slot index, which makes the tie-break between
//! equally good slots deterministic: the lowest index wins.

use crate::player::Player;
use crate::types::PlayerId;
use crate::utils::{rating_difference, ratings_within_tolerance};
use std::sync::Arc;

/// Number of waiting slots
pub const SLOT_CAPACITY: usize = 5;

#[derive(Debug, Default)]
pub struct WaitingSlots {
    slots: [Option<Arc<Player>>; SLOT_CAPACITY],
}

impl WaitingSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// First occupied slot whose occupant is strictly within `tolerance`
    pub fn find_instant(&self, rating: f64, tolerance: f64) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|p| ratings_within_tolerance(p.rating(), rating, tolerance))
        })
    }

    /// Place `player` in the first empty slot, returning its index
    ///
    /// Returns `None` and drops nothing when every slot is taken.
    pub fn park(&mut self, player: Arc<Player>) -> Option<usize> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(player);
        Some(index)
    }

    /// Occupied slot with the smallest rating difference to `rating`
    ///
    /// Only a strictly smaller difference replaces the current best, so the
    /// lowest index wins ties.
    pub fn closest(&self, rating: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(player) = slot else { continue };
            let diff = rating_difference(player.rating(), rating);
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((index, diff)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Free a slot, returning its occupant
    pub fn take(&mut self, index: usize) -> Option<Arc<Player>> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Player>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|player| player.id() == player_id)
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == SLOT_CAPACITY
    }

    /// Occupant ids in slot order
    pub fn snapshot(&self) -> Vec<Option<PlayerId>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map(|player| player.id()))
            .collect()
    }
}
