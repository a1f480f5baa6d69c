//! Main entry point for the ELO queue simulation
//!
//! Loads configuration, starts the matchmaker and player actors, and prints
//! the final rating report once the run ends or Ctrl+C is pressed.

use anyhow::Result;
use clap::Parser;
use elo_queue::config::{validate_config, AppConfig};
use elo_queue::simulation::{Simulation, SimulationReport};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// ELO Queue - self-adjusting rating matchmaking simulation
#[derive(Parser)]
#[command(
    name = "elo-queue",
    version,
    about = "Simulate a self-adjusting ELO matchmaking queue",
    long_about = "ELO Queue runs a set of independent player actors that randomly decide to \
                 queue for matches. A single matchmaker pairs them with a widening rating \
                 tolerance and resolves each match with a damped ELO update."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Player count override
    #[arg(short, long, value_name = "N", help = "Number of player actors")]
    players: Option<usize>,

    /// Seed override
    #[arg(short, long, value_name = "SEED", help = "Seed for a reproducible run")]
    seed: Option<u64>,

    /// Tick interval override
    #[arg(long, value_name = "MS", help = "Delay between actor decision ticks")]
    tick_ms: Option<u64>,

    /// Run budget override
    #[arg(long, value_name = "SECS", help = "Maximum wall-clock duration of the run")]
    duration_secs: Option<u64>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Print the report as JSON
    #[arg(long, help = "Print the final report as JSON instead of a table")]
    json: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without running")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    // Apply CLI overrides
    if let Some(players) = args.players {
        config.simulation.players = players;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(tick_ms) = args.tick_ms {
        config.simulation.tick_interval_ms = tick_ms;
    }
    if let Some(duration) = args.duration_secs {
        config.simulation.max_duration_seconds = duration;
    }
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    validate_config(&config)?;
    Ok(config)
}

/// Display startup banner with run information
fn display_startup_banner(config: &AppConfig) {
    info!("ELO Queue Simulation");
    info!("   Service: {}", config.service.name);
    info!("   Players: {}", config.simulation.players);
    info!(
        "   Seed: {}",
        config
            .simulation
            .seed
            .map_or_else(|| "random".to_string(), |s| s.to_string())
    );
    info!("   Tick interval: {}ms", config.simulation.tick_interval_ms);
    info!("   Max duration: {}s", config.simulation.max_duration_seconds);
    info!(
        "   Willingness: [{:.2}, {:.2}), idle limit: {}",
        config.rating.min_willingness, config.rating.max_willingness, config.rating.idle_limit
    );
}

fn print_report(report: &SimulationReport) {
    let summary = report.summary();
    println!("Simulation report");
    println!("  Elapsed: {}ms", report.elapsed_ms);
    println!("  Completed: {}", report.completed);
    println!(
        "  Players: {} ({} terminated)",
        summary.players, summary.terminated
    );
    println!(
        "  Games: {} ({} instant, {} forced)",
        report.stats.games_played, report.stats.instant_matches, report.stats.forced_matches
    );
    println!(
        "  Ratings: mean {:.2}, min {:.2}, max {:.2}, std dev {:.2}",
        summary.mean, summary.min, summary.max, summary.std_dev
    );
    println!("  Damper: {:.4}", report.damper);
    println!("  Ledger drift: {:.2e}", report.ledger_drift());

    let mut players = report.players.clone();
    players.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    println!();
    println!("  {:<38} {:>9} {:>7} {:>6} {:>10}", "player", "rating", "will", "games", "state");
    for player in players {
        println!(
            "  {:<38} {:>9.2} {:>7.3} {:>6} {:>10}",
            player.id, player.rating, player.willingness, player.games_played, player.state
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful - exiting without running");
        return Ok(());
    }

    let simulation = Simulation::new(config)?;
    let matchmaker = simulation.matchmaker().clone();

    let run = tokio::spawn(simulation.run());
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), stopping simulation");
                matchmaker.stop();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    let report = match run.await? {
        Ok(report) => report,
        Err(e) => {
            error!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }

    Ok(())
}
