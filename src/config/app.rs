//! Main application configuration
//!
//! This module defines the configuration structures for the simulation
//! driver, including environment variable and TOML loading and validation.

use crate::config::rating::RatingConfig;
use crate::error::SimulationError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub simulation: SimulationSettings,
    pub rating: RatingConfig,
}

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Name used in log output
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Time allowed for tasks to finish after stop, in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Simulation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of player actors
    pub players: usize,
    /// Base seed for reproducible runs; thread randomness when unset
    pub seed: Option<u64>,
    /// Delay between actor decision ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Wall-clock budget for a run in seconds
    pub max_duration_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "elo-queue".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 5,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            players: 50,
            seed: None,
            tick_interval_ms: 5,
            max_duration_seconds: 30,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(timeout) = parse_env("SHUTDOWN_TIMEOUT_SECONDS")? {
            self.service.shutdown_timeout_seconds = timeout;
        }

        // Simulation settings
        if let Some(players) = parse_env("SIM_PLAYERS")? {
            self.simulation.players = players;
        }
        if let Some(seed) = parse_env("SIM_SEED")? {
            self.simulation.seed = Some(seed);
        }
        if let Some(tick) = parse_env("SIM_TICK_INTERVAL_MS")? {
            self.simulation.tick_interval_ms = tick;
        }
        if let Some(duration) = parse_env("SIM_MAX_DURATION_SECONDS")? {
            self.simulation.max_duration_seconds = duration;
        }

        // Rating settings
        if let Some(baseline) = parse_env("RATING_BASELINE")? {
            self.rating.baseline_rating = baseline;
        }
        if let Some(idle_limit) = parse_env("RATING_IDLE_LIMIT")? {
            self.rating.idle_limit = idle_limit;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get actor tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_interval_ms)
    }

    /// Get run budget as Duration
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.simulation.max_duration_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.simulation.max_duration_seconds == 0 {
        return Err(anyhow!("Max duration must be greater than 0"));
    }

    // Validate simulation settings
    if config.simulation.players == 0 {
        return Err(anyhow!("Player count must be greater than 0"));
    }

    config
        .rating
        .validate()
        .map_err(|e| SimulationError::ConfigurationError {
            message: e.to_string(),
        })?;

    Ok(())
}
