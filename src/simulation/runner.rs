//! Simulation driver
//!
//! Builds a matchmaker and its player actors from configuration, runs them
//! as tokio tasks, and collects the final ratings once every actor has left
//! or the run budget is spent.

use crate::config::AppConfig;
use crate::error::{Result, SimulationError};
use crate::matchmaker::Matchmaker;
use crate::player::{ActorConfig, Player, PlayerActor};
use crate::random::source_for;
use crate::simulation::report::SimulationReport;
use crate::types::{ActorState, PlayerId, PlayerSnapshot};
use crate::utils::current_timestamp;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, sleep, timeout, Duration, Instant};
use tracing::{debug, error, info, warn};

// Random stream indices derived from the base seed
const MATCHMAKER_STREAM: u64 = 0;
const WILLINGNESS_STREAM: u64 = 1;
const FIRST_ACTOR_STREAM: u64 = 2;

const QUIESCENCE_CHECK_INTERVAL: Duration = Duration::from_millis(20);

/// A configured simulation, ready to run
pub struct Simulation {
    config: AppConfig,
    matchmaker: Arc<Matchmaker>,
    players: Vec<Arc<Player>>,
    actors: Vec<PlayerActor>,
}

impl Simulation {
    /// Create the matchmaker and one actor per configured player
    pub fn new(config: AppConfig) -> Result<Self> {
        let seed = config.simulation.seed;
        let matchmaker = Arc::new(Matchmaker::with_random(source_for(
            seed,
            MATCHMAKER_STREAM,
        )));

        let mut willingness_source = source_for(seed, WILLINGNESS_STREAM);
        let actor_config = ActorConfig::from(&config);
        let mut players = Vec::with_capacity(config.simulation.players);
        let mut actors = Vec::with_capacity(config.simulation.players);

        for index in 0..config.simulation.players {
            let player = Arc::new(Player::with_random_willingness(
                config.rating.baseline_rating,
                config.rating.min_willingness,
                config.rating.max_willingness,
                willingness_source.as_mut(),
            )?);

            actors.push(PlayerActor::new(
                Arc::clone(&player),
                Arc::clone(&matchmaker),
                source_for(seed, FIRST_ACTOR_STREAM + index as u64),
                actor_config.clone(),
            ));
            players.push(player);
        }

        info!(
            "Simulation prepared - players: {}, seed: {:?}, tick: {}ms",
            players.len(),
            seed,
            config.simulation.tick_interval_ms
        );

        Ok(Self {
            config,
            matchmaker,
            players,
            actors,
        })
    }

    pub fn matchmaker(&self) -> &Arc<Matchmaker> {
        &self.matchmaker
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    /// Run until every actor terminates, the run budget elapses, or the
    /// matchmaker is stopped externally
    pub async fn run(self) -> Result<SimulationReport> {
        let Simulation {
            config,
            matchmaker,
            players,
            actors,
        } = self;

        let started_at = current_timestamp();
        let start = Instant::now();
        let initial_rating: f64 = players.iter().map(|p| p.rating()).sum();

        let mut matchmaker_task: JoinHandle<Result<()>> = {
            let matchmaker = Arc::clone(&matchmaker);
            tokio::spawn(async move { matchmaker.run().await })
        };
        let mut matchmaker_result: Option<Result<()>> = None;

        let mut actor_tasks = JoinSet::new();
        for actor in actors {
            let id = actor.player().id();
            let shutdown = matchmaker.shutdown_signal();
            actor_tasks.spawn(async move { (id, actor.run(shutdown).await) });
        }

        let mut states: HashMap<PlayerId, ActorState> = HashMap::new();
        let mut failure: Option<anyhow::Error> = None;
        let mut stop_signal = matchmaker.shutdown_signal();
        let deadline = sleep(config.max_duration());
        tokio::pin!(deadline);
        let mut quiescence_check = interval(QUIESCENCE_CHECK_INTERVAL);

        loop {
            tokio::select! {
                joined = actor_tasks.join_next() => match joined {
                    Some(result) => record_actor(result, &mut states, &mut failure),
                    None => {
                        info!("All player actors have left");
                        break;
                    }
                },
                result = &mut matchmaker_task, if matchmaker_result.is_none() => {
                    matchmaker_result = Some(flatten_join(result));
                    warn!("Matchmaker loop ended before the actors");
                    break;
                }
                _ = &mut deadline => {
                    warn!(
                        "Run budget of {}s elapsed with {} actors still active",
                        config.simulation.max_duration_seconds,
                        actor_tasks.len()
                    );
                    break;
                }
                _ = stop_signal.changed() => {
                    info!("External stop received");
                    break;
                }
                _ = quiescence_check.tick() => {
                    if is_quiescent(&matchmaker, actor_tasks.len())? {
                        info!(
                            "Remaining {} players are all parked, no further match is possible",
                            actor_tasks.len()
                        );
                        break;
                    }
                }
            }

            if failure.is_some() {
                break;
            }
        }

        matchmaker.stop();
        let shutdown_timeout = config.shutdown_timeout();

        let drained = timeout(shutdown_timeout, async {
            while let Some(result) = actor_tasks.join_next().await {
                record_actor(result, &mut states, &mut failure);
            }
        })
        .await;
        if drained.is_err() {
            warn!("Actors did not stop within {:?}, aborting", shutdown_timeout);
            actor_tasks.abort_all();
        }

        let matchmaker_result = match matchmaker_result {
            Some(result) => result,
            None => match timeout(shutdown_timeout, &mut matchmaker_task).await {
                Ok(result) => flatten_join(result),
                Err(_) => {
                    matchmaker_task.abort();
                    Err(SimulationError::InternalError {
                        message: "Matchmaker loop did not stop in time".to_string(),
                    }
                    .into())
                }
            },
        };
        matchmaker_result?;
        if let Some(e) = failure {
            return Err(e);
        }

        let mut snapshots = Vec::with_capacity(players.len());
        for player in &players {
            let state = match states.get(&player.id()) {
                Some(state) => *state,
                None if matchmaker.is_queued(player.id())? => ActorState::Queued,
                None => ActorState::Idle,
            };
            snapshots.push(PlayerSnapshot {
                id: player.id(),
                rating: player.rating(),
                willingness: player.willingness(),
                games_played: player.games_played(),
                state,
            });
        }

        let active_rating = snapshots
            .iter()
            .filter(|p| p.state != ActorState::Terminated)
            .map(|p| p.rating)
            .sum();

        let report = SimulationReport {
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            completed: snapshots.iter().all(|p| p.state == ActorState::Terminated),
            players: snapshots,
            damper: matchmaker.damper()?,
            active_rating,
            initial_rating,
            stats: matchmaker.stats()?,
        };

        info!(
            "Simulation finished in {}ms - games: {}, damper: {:.3}, completed: {}",
            report.elapsed_ms, report.stats.games_played, report.damper, report.completed
        );
        Ok(report)
    }
}

/// Parked players only leave a slot when someone else submits. Once every
/// live actor is parked and the queue is empty, nobody ever will.
fn is_quiescent(matchmaker: &Matchmaker, live_actors: usize) -> Result<bool> {
    Ok(live_actors > 0
        && matchmaker.queue_len()? == 0
        && matchmaker.parked_len()? == live_actors)
}

fn flatten_join(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    result.map_err(|e| SimulationError::InternalError {
        message: format!("Matchmaker task failed: {}", e),
    })?
}

fn record_actor(
    result: std::result::Result<(PlayerId, Result<ActorState>), tokio::task::JoinError>,
    states: &mut HashMap<PlayerId, ActorState>,
    failure: &mut Option<anyhow::Error>,
) {
    match result {
        Ok((id, Ok(state))) => {
            debug!("Player {} finished in state {}", id, state);
            states.insert(id, state);
        }
        Ok((id, Err(e))) => {
            error!("Player {} failed: {}", id, e);
            failure.get_or_insert(e);
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            error!("Player task panicked: {}", e);
            failure.get_or_insert(
                SimulationError::InternalError {
                    message: format!("Player task failed: {}", e),
                }
                .into(),
            );
        }
    }
}
