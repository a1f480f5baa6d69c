//! Shared helpers for integration and load tests

#![allow(dead_code)]

use elo_queue::matchmaker::{GameRecord, Matchmaker, Resolution};
use elo_queue::player::Player;
use elo_queue::random::{RandomSource, ScriptedRandom};
use elo_queue::types::PlayerId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Random source wrapper that counts how many samples were drawn
pub struct CountingRandom<R> {
    inner: R,
    draws: Arc<AtomicUsize>,
}

impl<R: RandomSource> CountingRandom<R> {
    pub fn new(inner: R) -> (Self, Arc<AtomicUsize>) {
        let draws = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                draws: Arc::clone(&draws),
            },
            draws,
        )
    }
}

impl<R: RandomSource> RandomSource for CountingRandom<R> {
    fn sample(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.inner.sample()
    }
}

pub fn player(rating: f64) -> Arc<Player> {
    Arc::new(Player::new(rating, 0.5))
}

pub fn players(ratings: &[f64]) -> Vec<Arc<Player>> {
    ratings.iter().copied().map(player).collect()
}

/// Matchmaker whose contests replay `values`
pub fn scripted_matchmaker(values: &[f64]) -> Matchmaker {
    Matchmaker::with_random(Box::new(ScriptedRandom::new(values.to_vec())))
}

pub fn submit_all(matchmaker: &Matchmaker, players: &[Arc<Player>]) {
    for player in players {
        matchmaker.submit(Arc::clone(player)).unwrap();
    }
}

pub fn expect_parked(resolution: Resolution) -> (PlayerId, usize) {
    match resolution {
        Resolution::Parked { player_id, slot } => (player_id, slot),
        other => panic!("expected a parked player, got {:?}", other),
    }
}

pub fn expect_matched(resolution: Resolution) -> GameRecord {
    match resolution {
        Resolution::Matched(record) => record,
        other => panic!("expected a match, got {:?}", other),
    }
}

/// Every waiting player appears exactly once across queue and slots
pub fn assert_waiting_players_unique(matchmaker: &Matchmaker) {
    let queued = matchmaker.queued_players().unwrap();
    let parked: Vec<PlayerId> = matchmaker
        .slot_snapshot()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();

    let mut seen = HashSet::new();
    for id in queued.iter().chain(parked.iter()) {
        assert!(seen.insert(*id), "player {} is waiting twice", id);
    }
}
