//! Player actor decision loop
//!
//! Each tick the actor checks whether its player is already waiting in the
//! matchmaker. If not, it draws a sample and queues when the sample is at or
//! below the player's willingness; otherwise the idle counter grows. Reaching
//! the idle limit terminates the actor, which hands the player's rating back
//! to the damper exactly once.

use crate::config::AppConfig;
use crate::error::Result;
use crate::matchmaker::Matchmaker;
use crate::player::Player;
use crate::random::{checked_sample, RandomSource};
use crate::types::ActorState;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Actor loop tuning
#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Consecutive declines before the actor leaves
    pub idle_limit: u32,
    /// Delay between decision ticks
    pub tick_interval: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            idle_limit: 3,
            tick_interval: Duration::from_millis(5),
        }
    }
}

impl From<&AppConfig> for ActorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            idle_limit: config.rating.idle_limit,
            tick_interval: config.tick_interval(),
        }
    }
}

/// Drives one player's queue decisions
pub struct PlayerActor {
    player: Arc<Player>,
    matchmaker: Arc<Matchmaker>,
    rng: Box<dyn RandomSource>,
    config: ActorConfig,
    idle_ticks: u32,
    state: ActorState,
}

impl PlayerActor {
    pub fn new(
        player: Arc<Player>,
        matchmaker: Arc<Matchmaker>,
        rng: Box<dyn RandomSource>,
        config: ActorConfig,
    ) -> Self {
        Self {
            player,
            matchmaker,
            rng,
            config,
            idle_ticks: 0,
            state: ActorState::Idle,
        }
    }

    pub fn player(&self) -> &Arc<Player> {
        &self.player
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Consecutive ticks without queueing
    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    /// Make one decision
    pub fn tick(&mut self) -> Result<ActorState> {
        if self.state == ActorState::Terminated {
            return Ok(self.state);
        }

        if self.matchmaker.is_queued(self.player.id())? {
            self.state = ActorState::Queued;
            return Ok(self.state);
        }
        self.state = ActorState::Idle;

        let sample = checked_sample(self.rng.as_mut())?;
        if sample <= self.player.willingness() {
            self.matchmaker.submit(Arc::clone(&self.player))?;
            self.idle_ticks = 0;
            self.state = ActorState::Queued;
        } else {
            self.idle_ticks += 1;
            if self.idle_ticks >= self.config.idle_limit {
                self.terminate()?;
            }
        }

        Ok(self.state)
    }

    fn terminate(&mut self) -> Result<()> {
        let rating = self.player.rating();
        self.matchmaker.adjust_damper(-rating)?;
        self.state = ActorState::Terminated;

        info!(
            "Player {} left after {} idle ticks - rating: {:.2}, games: {}",
            self.player.id(),
            self.idle_ticks,
            rating,
            self.player.games_played()
        );
        Ok(())
    }

    /// Run decision ticks until the actor terminates or `shutdown` fires
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<ActorState> {
        debug!(
            "Player {} started - willingness: {:.3}",
            self.player.id(),
            self.player.willingness()
        );

        loop {
            if *shutdown.borrow() {
                debug!("Player {} stopped in state {}", self.player.id(), self.state);
                return Ok(self.state);
            }

            if self.tick()? == ActorState::Terminated {
                return Ok(ActorState::Terminated);
            }

            tokio::select! {
                _ = sleep(self.config.tick_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return Ok(self.state);
                    }
                }
            }
        }
    }
}
