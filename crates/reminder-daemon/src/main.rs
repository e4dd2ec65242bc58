//! Reminder daemon entry point
//!
//! Run with:
//! ```bash
//! cargo run -p reminder-daemon
//! ```
//!
//! Configuration is loaded from environment variables (`.env` supported).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use reminder_common::{try_init_tracing, AppConfig};
use reminder_db::{create_pool, DatabaseConfig, EntityStore};
use reminder_service::{LocalFileStore, LoggingPushSink, NotificationScheduler};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Daemon failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting reminder daemon...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    let pool = create_pool(&DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..DatabaseConfig::default()
    })
    .await?;
    info!("Database pool created");

    reminder_db::run_migrations(&pool).await?;
    info!("Migrations applied");

    let files = Arc::new(LocalFileStore::new(&config.storage.files_dir));
    // Fails when the active/inactive status rows are missing; the
    // lifecycle cannot run without them.
    let store = Arc::new(EntityStore::connect(pool.clone(), files).await?);

    let scheduler = NotificationScheduler::new(
        Arc::clone(&store),
        Arc::new(LoggingPushSink),
        Duration::from_secs(config.scheduler.interval_secs),
        config.scheduler.window_secs,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Let an in-flight pass finish before tearing the pool down
    let _ = shutdown_tx.send(true);
    scheduler_task.await?;
    pool.close().await;

    info!("Reminder daemon stopped");
    Ok(())
}
