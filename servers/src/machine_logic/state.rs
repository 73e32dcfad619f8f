use lib_common::connections::db_postgres::Database;
use lib_common::telemetry::generator::TelemetryGenerator;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Shared state for the subscriber-facing WebSocket server.
#[derive(Clone)]
pub struct AppState {
    // Pooled store handle, shared by every connection's snapshot reads
    pub db: Arc<Database>,
    // Cadence of the per-connection background push
    pub push_interval: Duration,
    // Process-wide shutdown signal; each socket loop subscribes
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(db: Arc<Database>, push_interval: Duration, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self {
            db,
            push_interval,
            shutdown_tx,
        }
    }
}

/// Shared state for the feeder's writer loops.
#[derive(Clone)]
pub struct FeederState {
    pub db: Arc<Database>,
    pub generator: TelemetryGenerator,
    // Axis rows written since the monitor last looked
    pub axis_inserts: Arc<AtomicU64>,
}

impl FeederState {
    pub fn new(db: Arc<Database>, generator: TelemetryGenerator) -> Self {
        Self {
            db,
            generator,
            axis_inserts: Arc::new(AtomicU64::new(0)),
        }
    }
}
