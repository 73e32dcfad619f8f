//! # Fleet Subscriber Server
//!
//! The subscriber-facing WebSocket server for the machinesim fleet
//! store. Every connection is accepted unconditionally and immediately
//! receives the current latest-per-key snapshot of the machine, tool
//! and axis streams; a background tick keeps re-resolving and pushing
//! the projections until the client disconnects.
//!
//! ## Core Responsibilities:
//! - **WebSocket Termination:** `/ws` upgrade endpoint via Axum, with
//!   optional WSS when TLS cert/key paths are configured.
//! - **Snapshot Fan-out:** per-connection periodic push of the three
//!   latest-per-key projections from the shared store pool.
//! - **On-Demand Queries:** token-authenticated `get_machine_data` /
//!   `get_tool_data` / `get_axis_data` requests.
//! - **Lifecycle:** `/health` endpoint and broadcast-driven graceful
//!   shutdown on interrupt.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lib_common::connections::db_postgres::Database;
use servers::machine_logic::{config, downstream, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Rustls 0.23+ requires an explicit crypto provider to be installed
    // before any TLS config is built.
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");

    let config = config::load_config();
    info!("Configuration loaded: Port: {}", config.port());

    // A store that cannot be reached at startup is fatal; nothing runs
    // without it.
    let db = Database::new(config.database_url(), config.db_pool_size())
        .await
        .context("Store connection failed at startup")?;
    db.ping().await.context("Store ping failed at startup")?;
    info!("Connected to the fleet store.");

    let (shutdown_tx, _) = broadcast::channel(1);
    let app_state = AppState::new(Arc::new(db), config.push_interval(), shutdown_tx.clone());

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down.");
            let _ = signal_tx.send(());
        }
    });

    downstream::run(config, app_state, shutdown_tx.subscribe()).await;

    Ok(())
}
