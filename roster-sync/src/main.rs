//! roster-sync - Team feed synchronization service
//!
//! Periodically reconciles the local teams table against the upstream
//! teams feed. Serves /health, POST /sync and GET /sync/status.
//!
//! Run with `--once` to perform a single sync and exit (non-zero on
//! failure), e.g. from cron.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use roster_common::config::{load_toml_config, RootFolderInitializer, RootFolderResolver};
use roster_sync::config::FeedConfig;
use roster_sync::db::SqliteTeamStore;
use roster_sync::services::{spawn_schedule, FeedClient, Reconciler, RetryPolicy, SyncJob};
use roster_sync::{build_router, AppState};
use tracing::{error, info};

/// Command-line arguments for roster-sync
#[derive(Parser, Debug)]
#[command(name = "roster-sync")]
#[command(about = "Synchronizes teams from the upstream feed")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding roster.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address for the HTTP control surface
    #[arg(short, long, env = "ROSTER_BIND")]
    bind: Option<String>,

    /// Run one sync and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .init();

    info!("Starting roster-sync v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = roster_common::db::init_database(&db_path).await?;

    let feed_config = FeedConfig::resolve(&toml_config.feed);
    info!(
        url = %feed_config.base_url,
        sport_id = %feed_config.sport_id,
        league = %feed_config.target_league,
        "Feed configured"
    );

    let reconciler = Reconciler::new(feed_config.target_league.clone());
    let client = FeedClient::new(feed_config)?;
    let store = Arc::new(SqliteTeamStore::new(pool));
    let policy = RetryPolicy::from_schedule(&toml_config.schedule);
    let job = Arc::new(SyncJob::new(client, reconciler, store, policy));

    if args.once {
        let record = job.run().await;
        if let Some(err) = record.error() {
            error!("Sync failed after {} attempt(s)", record.attempts);
            anyhow::bail!("sync failed: {}", err);
        }
        return Ok(());
    }

    let interval = Duration::from_secs(toml_config.schedule.interval_secs.max(1));
    info!("Sync interval: {}s", interval.as_secs());
    let schedule = spawn_schedule(job.clone(), interval);

    let app = build_router(AppState::new(job));

    let bind = args.bind.unwrap_or(toml_config.server.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedule.abort();
    info!("roster-sync stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
