//! Matchmaker queue and resolution loop
//!
//! All mutable matchmaking state (request queue, waiting slots, damper and
//! the contest random source) lives behind one mutex. A resolution
//! iteration, including the contest it may trigger, runs entirely under that
//! lock, so submissions from concurrent actors never observe a half-applied
//! match.
//!
//! Each iteration dequeues the head request and resolves it in three tiers:
//! 1. instant match with the first waiting player within tolerance,
//! 2. park in the first empty waiting slot,
//! 3. forced match with the closest waiting player.

use crate::error::{Result, SimulationError};
use crate::matchmaker::slots::WaitingSlots;
use crate::player::Player;
use crate::random::{checked_sample, RandomSource, ThreadRandom};
use crate::rating::{decide_outcome, exchange, tolerance, ContestOutcome, Damper};
use crate::types::{GameId, MatchTier, PlayerId};
use crate::utils::{current_timestamp, generate_game_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

/// Counters for matchmaker activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchmakerStats {
    /// Requests accepted into the queue
    pub submissions: u64,
    /// Requests rejected because the player was already waiting
    pub duplicate_submissions: u64,
    /// Requests that ended up in a waiting slot
    pub parked: u64,
    pub instant_matches: u64,
    pub forced_matches: u64,
    pub games_played: u64,
}

/// A resolved contest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: GameId,
    pub tier: MatchTier,
    /// Slot the opponent was taken from
    pub slot: usize,
    /// The dequeued player
    pub challenger: PlayerId,
    /// The player taken from the waiting slot
    pub opponent: PlayerId,
    /// Tolerance in effect when the challenger was dequeued
    pub tolerance: f64,
    pub outcome: ContestOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Result of one resolution iteration
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The queue was empty
    Idle,
    /// The dequeued player is now waiting in `slot`
    Parked { player_id: PlayerId, slot: usize },
    /// The dequeued player played a contest
    Matched(GameRecord),
}

struct MatchmakerState {
    queue: VecDeque<Arc<Player>>,
    slots: WaitingSlots,
    damper: Damper,
    rng: Box<dyn RandomSource>,
    stats: MatchmakerStats,
}

impl MatchmakerState {
    fn is_waiting(&self, player_id: PlayerId) -> bool {
        self.queue.iter().any(|p| p.id() == player_id) || self.slots.contains(player_id)
    }

    /// Resolve `current`, leaving all state untouched on error
    fn resolve(&mut self, current: &Arc<Player>, tolerance: f64) -> Result<Resolution> {
        let rating = current.rating();

        if let Some(slot) = self.slots.find_instant(rating, tolerance) {
            let record = self.match_with_slot(current, slot, MatchTier::Instant, tolerance)?;
            self.stats.instant_matches += 1;
            return Ok(Resolution::Matched(record));
        }

        if let Some(slot) = self.slots.park(Arc::clone(current)) {
            self.stats.parked += 1;
            return Ok(Resolution::Parked {
                player_id: current.id(),
                slot,
            });
        }

        let slot = forced_slot(&self.slots, rating)?;
        let record = self.match_with_slot(current, slot, MatchTier::Forced, tolerance)?;
        self.stats.forced_matches += 1;
        Ok(Resolution::Matched(record))
    }

    fn match_with_slot(
        &mut self,
        current: &Arc<Player>,
        slot: usize,
        tier: MatchTier,
        tolerance: f64,
    ) -> Result<GameRecord> {
        let opponent = self
            .slots
            .get(slot)
            .cloned()
            .ok_or(SimulationError::NoOccupiedSlot)?;

        let outcome = self.play_game(current, &opponent)?;
        self.slots.take(slot);

        Ok(GameRecord {
            game_id: generate_game_id(),
            tier,
            slot,
            challenger: current.id(),
            opponent: opponent.id(),
            tolerance,
            outcome,
            timestamp: current_timestamp(),
        })
    }

    /// Decide a contest and apply the rating exchange to both players
    fn play_game(&mut self, p1: &Arc<Player>, p2: &Arc<Player>) -> Result<ContestOutcome> {
        let sample = checked_sample(self.rng.as_mut())?;
        let (winner, loser) = if decide_outcome(p1.rating_diff(p2), sample) {
            (p1, p2)
        } else {
            (p2, p1)
        };

        let winner_rating = winner.rating();
        let loser_rating = loser.rating();
        let damper_before = self.damper.value();
        let (delta, loser_deduction) = exchange(winner_rating, loser_rating, &mut self.damper);

        winner.adjust_rating(delta);
        loser.adjust_rating(-loser_deduction);
        winner.record_game();
        loser.record_game();
        self.stats.games_played += 1;

        Ok(ContestOutcome {
            winner: winner.id(),
            loser: loser.id(),
            gap: winner_rating - loser_rating,
            delta,
            loser_deduction,
            damper_before,
            damper_after: self.damper.value(),
        })
    }
}

/// Slot for a forced match; reaching this with no waiting player is a
/// scheduling bug, since parking must have succeeded instead
fn forced_slot(slots: &WaitingSlots, rating: f64) -> Result<usize> {
    slots.closest(rating).ok_or_else(|| {
        error!("Forced match reached with every waiting slot empty");
        SimulationError::NoOccupiedSlot.into()
    })
}

/// The matchmaker: queue, waiting slots and damper for a single game
pub struct Matchmaker {
    state: Mutex<MatchmakerState>,
    queue_signal: Notify,
    shutdown: watch::Sender<bool>,
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Matchmaker {
    /// Create a matchmaker drawing contest outcomes from thread randomness
    pub fn new() -> Self {
        Self::with_random(Box::new(ThreadRandom::new()))
    }

    /// Create a matchmaker drawing contest outcomes from `rng`
    pub fn with_random(rng: Box<dyn RandomSource>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Mutex::new(MatchmakerState {
                queue: VecDeque::new(),
                slots: WaitingSlots::new(),
                damper: Damper::default(),
                rng,
                stats: MatchmakerStats::default(),
            }),
            queue_signal: Notify::new(),
            shutdown,
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, MatchmakerState>> {
        self.state
            .lock()
            .map_err(|_| SimulationError::lock_poisoned("matchmaker state").into())
    }

    /// Append `player` to the queue
    ///
    /// A player that is already waiting (queued or parked) is rejected with
    /// `DuplicateSubmission`; callers are expected to check `is_queued` first.
    pub fn submit(&self, player: Arc<Player>) -> Result<()> {
        {
            let mut state = self.lock_state()?;
            if state.is_waiting(player.id()) {
                state.stats.duplicate_submissions += 1;
                warn!("Rejected duplicate submission from player {}", player.id());
                return Err(SimulationError::DuplicateSubmission {
                    player_id: player.id().to_string(),
                }
                .into());
            }

            state.queue.push_back(Arc::clone(&player));
            state.stats.submissions += 1;

            debug!(
                "Player {} queued - rating: {:.2}, queue_len: {}",
                player.id(),
                player.rating(),
                state.queue.len()
            );
        }

        self.queue_signal.notify_one();
        Ok(())
    }

    /// Whether `player_id` is waiting for a match, in the queue or in a slot
    pub fn is_queued(&self, player_id: PlayerId) -> Result<bool> {
        Ok(self.lock_state()?.is_waiting(player_id))
    }

    /// Add `amount` to the damper
    pub fn adjust_damper(&self, amount: f64) -> Result<()> {
        let mut state = self.lock_state()?;
        state.damper.adjust(amount);
        debug!(
            "Damper adjusted by {:.2} - now {:.2}",
            amount,
            state.damper.value()
        );
        Ok(())
    }

    pub fn damper(&self) -> Result<f64> {
        Ok(self.lock_state()?.damper.value())
    }

    pub fn queue_len(&self) -> Result<usize> {
        Ok(self.lock_state()?.queue.len())
    }

    /// Number of occupied waiting slots
    pub fn parked_len(&self) -> Result<usize> {
        Ok(self.lock_state()?.slots.occupied())
    }

    /// Queued player ids, head first
    pub fn queued_players(&self) -> Result<Vec<PlayerId>> {
        Ok(self.lock_state()?.queue.iter().map(|p| p.id()).collect())
    }

    /// Waiting slot occupants in slot order
    pub fn slot_snapshot(&self) -> Result<Vec<Option<PlayerId>>> {
        Ok(self.lock_state()?.slots.snapshot())
    }

    pub fn stats(&self) -> Result<MatchmakerStats> {
        Ok(self.lock_state()?.stats.clone())
    }

    /// Play a single contest between two players outside the queue
    pub fn play_game(&self, p1: &Arc<Player>, p2: &Arc<Player>) -> Result<ContestOutcome> {
        self.lock_state()?.play_game(p1, p2)
    }

    /// Run one resolution iteration on the head of the queue
    pub fn resolve_next(&self) -> Result<Resolution> {
        let mut state = self.lock_state()?;

        let queue_len = state.queue.len();
        let Some(current) = state.queue.pop_front() else {
            return Ok(Resolution::Idle);
        };
        let tolerance = tolerance(queue_len);

        match state.resolve(&current, tolerance) {
            Ok(resolution) => {
                match &resolution {
                    Resolution::Parked { player_id, slot } => debug!(
                        "Player {} parked in slot {} - tolerance: {:.2}",
                        player_id, slot, tolerance
                    ),
                    Resolution::Matched(record) => debug!(
                        "{} match in slot {} - winner: {}, delta: +{:.2}/-{:.2}, damper: {:.2}",
                        record.tier,
                        record.slot,
                        record.outcome.winner,
                        record.outcome.delta,
                        record.outcome.loser_deduction,
                        record.outcome.damper_after
                    ),
                    Resolution::Idle => {}
                }
                Ok(resolution)
            }
            Err(e) => {
                state.queue.push_front(current);
                Err(e)
            }
        }
    }

    /// Receiver that flips to `true` once `stop` is called
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Ask the resolution loop (and any actor watching the signal) to stop
    pub fn stop(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Matchmaker stop requested");
        }
        self.queue_signal.notify_waiters();
    }

    /// Resolve requests until stopped, waiting while the queue is empty
    ///
    /// The stop signal is checked before every iteration; a contest already
    /// being resolved always completes first.
    pub async fn run(&self) -> Result<()> {
        let mut shutdown = self.shutdown.subscribe();
        info!("Matchmaker resolution loop started");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            match self.resolve_next() {
                Ok(Resolution::Idle) => {
                    tokio::select! {
                        _ = self.queue_signal.notified() => {}
                        _ = shutdown.changed() => {}
                    }
                }
                Ok(_) => tokio::task::yield_now().await,
                Err(e) => {
                    error!("Matchmaker resolution loop failed: {}", e);
                    return Err(e);
                }
            }
        }

        let stats = self.stats()?;
        info!(
            "Matchmaker resolution loop stopped - games: {}, instant: {}, forced: {}",
            stats.games_played, stats.instant_matches, stats.forced_matches
        );
        Ok(())
    }
}
