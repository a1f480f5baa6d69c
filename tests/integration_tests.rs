//! End-to-end matchmaking scenarios against the public API

mod fixtures;

use elo_queue::config::AppConfig;
use elo_queue::matchmaker::{Matchmaker, Resolution, SLOT_CAPACITY};
use elo_queue::player::{ActorConfig, Player, PlayerActor};
use elo_queue::random::{ScriptedRandom, SeededRandom};
use elo_queue::rating::compute_delta;
use elo_queue::simulation::Simulation;
use elo_queue::types::{ActorState, MatchTier};
use fixtures::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

#[test]
fn test_two_equal_players_park_then_match() {
    let mm = Matchmaker::new();
    let a = player(0.0);
    let b = player(0.0);
    submit_all(&mm, &[Arc::clone(&a), Arc::clone(&b)]);

    let (parked, slot) = expect_parked(mm.resolve_next().unwrap());
    assert_eq!(parked, a.id());
    assert_eq!(slot, 0);

    let record = expect_matched(mm.resolve_next().unwrap());
    assert_eq!(record.tier, MatchTier::Instant);
    assert_eq!(record.slot, 0);
    assert_eq!(record.challenger, b.id());
    assert_eq!(record.opponent, a.id());
    assert!((record.tolerance - 1.1).abs() < 1e-12);

    let delta = record.outcome.delta;
    assert!((2.5..=7.5).contains(&delta));
    assert!((a.rating() + b.rating()).abs() < 1e-12);
    assert!((a.rating().abs() - delta).abs() < 1e-12);

    assert_eq!(mm.parked_len().unwrap(), 0);
    assert_eq!(mm.queue_len().unwrap(), 0);
    assert_eq!(a.games_played(), 1);
    assert_eq!(b.games_played(), 1);
}

#[test]
fn test_requests_resolve_in_submission_order() {
    let mm = Matchmaker::new();
    let queued = players(&[0.0, 100.0, 200.0]);
    submit_all(&mm, &queued);

    for (index, expected) in queued.iter().enumerate() {
        let (player_id, slot) = expect_parked(mm.resolve_next().unwrap());
        assert_eq!(player_id, expected.id());
        assert_eq!(slot, index);
    }
    assert!(matches!(mm.resolve_next().unwrap(), Resolution::Idle));
}

#[test]
fn test_equal_ratings_pair_off_as_they_arrive() {
    let mm = scripted_matchmaker(&[0.7, 0.2, 0.5]);
    let six = players(&[0.0; 6]);
    submit_all(&mm, &six);

    for pair in six.chunks(2) {
        let (parked, slot) = expect_parked(mm.resolve_next().unwrap());
        assert_eq!(parked, pair[0].id());
        assert_eq!(slot, 0);

        let record = expect_matched(mm.resolve_next().unwrap());
        assert_eq!(record.tier, MatchTier::Instant);
        assert_eq!(record.slot, 0);
        assert_eq!(record.opponent, pair[0].id());
    }

    let stats = mm.stats().unwrap();
    assert_eq!(stats.games_played, 3);
    assert_eq!(stats.instant_matches, 3);
    assert_eq!(stats.parked, 3);
}

#[test]
fn test_instant_match_takes_first_qualifying_slot() {
    let mm = scripted_matchmaker(&[0.5]);
    let waiting = players(&[0.0, 3.0, 6.0, 9.0, 12.0]);
    submit_all(&mm, &waiting);
    for (index, expected) in waiting.iter().enumerate() {
        let (player_id, slot) = expect_parked(mm.resolve_next().unwrap());
        assert_eq!(player_id, expected.id());
        assert_eq!(slot, index);
    }

    // A backlog of ten widens the tolerance to about 3.48, so both slot 0
    // and slot 1 are within reach of a 1.5 rated challenger
    let challenger = player(1.5);
    mm.submit(Arc::clone(&challenger)).unwrap();
    submit_all(&mm, &players(&[1000.0; 9]));

    let record = expect_matched(mm.resolve_next().unwrap());
    assert_eq!(record.tier, MatchTier::Instant);
    assert_eq!(record.slot, 0);
    assert_eq!(record.challenger, challenger.id());
    assert_eq!(record.opponent, waiting[0].id());
    assert!((record.tolerance - 10f64.sqrt() * 1.1).abs() < 1e-12);
    assert_eq!(
        mm.slot_snapshot().unwrap()[1],
        Some(waiting[1].id()),
        "equally close later slot stays occupied"
    );
}

#[test]
fn test_forced_match_tie_goes_to_lower_slot() {
    let mm = scripted_matchmaker(&[0.5]);
    let waiting = players(&[0.0, 10.0, 20.0, 30.0, 40.0]);
    submit_all(&mm, &waiting);
    for _ in 0..SLOT_CAPACITY {
        expect_parked(mm.resolve_next().unwrap());
    }

    let challenger = player(15.0);
    mm.submit(Arc::clone(&challenger)).unwrap();
    let record = expect_matched(mm.resolve_next().unwrap());

    assert_eq!(record.tier, MatchTier::Forced);
    assert_eq!(record.slot, 1);
    assert_eq!(record.opponent, waiting[1].id());

    // Favored challenger wins on a sample of 0.5 against a 0.4 threshold
    assert_eq!(record.outcome.winner, challenger.id());
    assert!((record.outcome.gap - 5.0).abs() < 1e-12);
    assert!((record.outcome.delta - compute_delta(5.0)).abs() < 1e-12);
    assert!((challenger.rating() - (15.0 + compute_delta(5.0))).abs() < 1e-12);

    assert_eq!(mm.slot_snapshot().unwrap()[1], None);
    assert_eq!(mm.stats().unwrap().forced_matches, 1);
}

#[test]
fn test_damper_drains_over_successive_contests() {
    let mm = scripted_matchmaker(&[0.5, 0.5, 0.5]);
    mm.adjust_damper(0.25).unwrap();

    let expected_damper = [0.15, 0.05, 0.0];
    let expected_extra = [0.1, 0.1, 0.05];
    for (damper, extra) in expected_damper.iter().zip(expected_extra) {
        let outcome = mm.play_game(&player(0.0), &player(0.0)).unwrap();
        assert_eq!(outcome.delta, 5.0);
        assert!((outcome.loser_deduction - (5.0 + extra)).abs() < 1e-9);
        assert!((outcome.damper_after - damper).abs() < 1e-9);
    }
    assert_eq!(mm.damper().unwrap(), 0.0);
}

#[test]
fn test_idle_actor_terminates_and_charges_damper_once() {
    let mm = Arc::new(Matchmaker::new());
    let player = Arc::new(Player::new(12.5, 0.3));
    let mut actor = PlayerActor::new(
        Arc::clone(&player),
        Arc::clone(&mm),
        Box::new(ScriptedRandom::new([0.9, 0.9, 0.9])),
        ActorConfig::default(),
    );

    assert_eq!(actor.tick().unwrap(), ActorState::Idle);
    assert_eq!(actor.tick().unwrap(), ActorState::Idle);
    assert_eq!(actor.tick().unwrap(), ActorState::Terminated);
    assert_eq!(mm.damper().unwrap(), -12.5);

    assert_eq!(actor.tick().unwrap(), ActorState::Terminated);
    assert_eq!(mm.damper().unwrap(), -12.5);
    assert!(!mm.is_queued(player.id()).unwrap());
}

#[test]
fn test_waiting_players_stay_unique_under_random_traffic() {
    let mm = Matchmaker::with_random(Box::new(SeededRandom::new(3)));
    let mut traffic = ChaCha8Rng::seed_from_u64(17);
    let pool: Vec<Arc<Player>> = (0..20)
        .map(|_| player(traffic.gen_range(-30.0..30.0)))
        .collect();
    let initial: f64 = pool.iter().map(|p| p.rating()).sum();

    for _ in 0..2_000 {
        let candidate = &pool[traffic.gen_range(0..pool.len())];
        if !mm.is_queued(candidate.id()).unwrap() {
            mm.submit(Arc::clone(candidate)).unwrap();
        }
        if traffic.gen_bool(0.7) {
            mm.resolve_next().unwrap();
        }
        assert_waiting_players_unique(&mm);
    }

    let stats = mm.stats().unwrap();
    assert_eq!(stats.duplicate_submissions, 0);
    let games: u32 = pool.iter().map(|p| p.games_played()).sum();
    assert_eq!(games as u64, stats.games_played * 2);

    let total: f64 = pool.iter().map(|p| p.rating()).sum();
    assert!((total - initial).abs() < 1e-6, "contests must be zero-sum");
}

#[test]
fn test_only_contests_draw_samples() {
    let (rng, draws) = CountingRandom::new(SeededRandom::new(5));
    let mm = Matchmaker::with_random(Box::new(rng));
    submit_all(&mm, &players(&[0.0, 50.0, 0.5, 100.0]));

    while mm.queue_len().unwrap() > 0 {
        mm.resolve_next().unwrap();
    }

    let stats = mm.stats().unwrap();
    assert_eq!(stats.parked, 3);
    assert_eq!(stats.games_played, 1);
    assert_eq!(draws.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn test_resubmitting_a_parked_player_is_rejected() {
    let mm = Matchmaker::new();
    let a = player(0.0);
    mm.submit(Arc::clone(&a)).unwrap();
    expect_parked(mm.resolve_next().unwrap());

    assert!(mm.is_queued(a.id()).unwrap());
    assert!(mm.submit(Arc::clone(&a)).is_err());
    assert_eq!(mm.queue_len().unwrap(), 0);
    assert_eq!(mm.stats().unwrap().duplicate_submissions, 1);
}

#[tokio::test]
async fn test_seeded_simulation_keeps_rating_ledger() {
    let mut config = AppConfig::default();
    config.simulation.players = 24;
    config.simulation.seed = Some(99);
    config.simulation.tick_interval_ms = 1;
    config.simulation.max_duration_seconds = 10;

    let report = Simulation::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.players.len(), 24);
    assert!(report.ledger_drift().abs() < 1e-6);

    let games: u32 = report.players.iter().map(|p| p.games_played).sum();
    assert_eq!(games as u64, report.stats.games_played * 2);
    assert_eq!(
        report.stats.games_played,
        report.stats.instant_matches + report.stats.forced_matches
    );

    let summary = report.summary();
    assert_eq!(summary.players, 24);
    assert_eq!(
        report.completed,
        summary.terminated == summary.players,
        "completed flag matches actor states"
    );
}
