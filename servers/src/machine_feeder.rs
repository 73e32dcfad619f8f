//! # Fleet Telemetry Feeder
//!
//! Drives the simulated fleet: bootstraps the store schema, provisions
//! the static machine and axis rows once, then runs one independent
//! periodic writer loop per telemetry stream (tool samples, tool-usage
//! events, axis samples), each on its own cadence against the shared
//! connection pool.
//!
//! ## Core Responsibilities:
//! - **Schema Bootstrap:** idempotent DDL on every start.
//! - **Provisioning:** insert-or-ignore machine and axis definitions.
//! - **Multi-Rate Ingestion:** independent tokio task per stream; a
//!   failing write is logged and never stalls the round.
//! - **Lifecycle:** ctrl-c fans a shutdown signal out to every loop;
//!   the pool is closed after all writers have exited.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lib_common::connections::db_postgres::Database;
use lib_common::connections::schema;
use lib_common::telemetry::generator::TelemetryGenerator;
use servers::machine_logic::{config, ingest, monitor, state::FeederState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");

    let config = config::load_config();
    info!(
        "Feeding {} machines starting at id {}",
        config.machine_count(),
        config.machine_start_id()
    );

    // A store that cannot be reached at startup is fatal; the loops
    // never start.
    let db = Database::new(config.database_url(), config.db_pool_size())
        .await
        .context("Store connection failed at startup")?;
    db.ping().await.context("Store ping failed at startup")?;
    info!("Connected to the fleet store.");

    let db = Arc::new(db);
    schema::ensure_schema(&db)
        .await
        .context("Schema bootstrap failed")?;

    let generator = TelemetryGenerator::new(
        config.max_acceleration(),
        config.max_velocity(),
        config.tool_capacity(),
    );
    let state = FeederState::new(Arc::clone(&db), generator);

    // Static entities go in exactly once, before any periodic writer
    // starts; re-runs are no-ops.
    ingest::provision(&config, &state)
        .await
        .context("Fleet provisioning failed")?;

    let (shutdown_tx, _) = broadcast::channel(1);

    let mut tasks = Vec::new();
    tasks.push(tokio::spawn(ingest::run_tool_stream(
        config.clone(),
        state.clone(),
        shutdown_tx.subscribe(),
    )));
    tasks.push(tokio::spawn(ingest::run_tool_usage_stream(
        config.clone(),
        state.clone(),
        shutdown_tx.subscribe(),
    )));
    tasks.push(tokio::spawn(ingest::run_axis_stream(
        config.clone(),
        state.clone(),
        shutdown_tx.subscribe(),
    )));
    tasks.push(tokio::spawn(monitor::run(
        state.clone(),
        shutdown_tx.subscribe(),
    )));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    info!("Interrupt received, stopping all streams.");
    let _ = shutdown_tx.send(());

    for task in tasks {
        let _ = task.await;
    }

    db.close().await;
    info!("All streams stopped, pool closed.");

    Ok(())
}
