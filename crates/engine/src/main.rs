//! space-engine: hosts the event scheduler for the game server.
//!
//! Loads `space-engine.toml`, registers the cold-start periodic ticks,
//! starts the driver lanes, and runs until SIGINT/SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! space-engine --config config/space-engine.toml
//!
//! # Via environment variables
//! SPACE_ENGINE_CONFIG=/etc/space-engine.toml RUST_LOG=space_events=debug space-engine
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use space_events::{Command, Driver, EngineConfig, Payload, Scheduler};
use tracing::{info, warn};

/// Event scheduler host for the space game server.
#[derive(Parser, Debug)]
#[command(name = "space-engine", version, about)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "SPACE_ENGINE_CONFIG", default_value = "config/space-engine.toml")]
    config: PathBuf,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, env = "SPACE_ENGINE_LOG", default_value = "info")]
    log_level: String,

    /// Interval in seconds between metrics log lines (0 = disabled).
    #[arg(long, env = "SPACE_ENGINE_METRICS_INTERVAL", default_value_t = 30)]
    metrics_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env-backed args.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    info!(?cli, "starting space-engine");

    let config = match EngineConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %cli.config.display(), error = %e, "config not loaded, using defaults");
            EngineConfig::default()
        }
    };
    config.log_summary();

    let scheduler = Arc::new(Scheduler::new(config.scheduler.clone()));

    for periodic in config.periodics() {
        let system = periodic.system;
        let name = periodic.name.clone();
        scheduler.register_periodic(periodic, |cmd: &Command| {
            let command = cmd.clone();
            Payload::suspendable(move || async move {
                tracing::debug!(command = %command, "periodic tick");
                Ok(())
            })
        });
        scheduler.start_periodic(&name, system);
    }

    let handle = Driver::new(Arc::clone(&scheduler), config.driver.clone()).spawn();
    info!(lanes = handle.lane_count(), "driver running");

    // Periodic metrics reporter.
    let reporter = (cli.metrics_interval > 0).then(|| {
        let scheduler = Arc::clone(&scheduler);
        let period = Duration::from_secs(cli.metrics_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let m = scheduler.metrics();
                info!(
                    submitted = m.submitted,
                    dispatched = m.total_dispatched(),
                    failed = m.total_failed(),
                    queue_depth = m.queue_depth,
                    "scheduler metrics"
                );
            }
        })
    });

    shutdown_signal().await?;
    info!("shutdown signal received");

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    let discarded = handle.shutdown().await;

    let m = scheduler.metrics();
    info!(
        submitted = m.submitted,
        dispatched = m.total_dispatched(),
        failed = m.total_failed(),
        discarded,
        "space-engine exited cleanly"
    );
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = ctrl_c => res?,
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await?;
    }

    Ok(())
}
