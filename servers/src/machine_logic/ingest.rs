//! # Multi-Rate Ingestion Scheduler
//!
//! One independent writer loop per telemetry stream, each on its own
//! cadence. The loops share nothing but the pooled store handle: a slow
//! or failing round in one stream never delays another stream's
//! schedule. Rounds are sequential within a stream; the scheduler is
//! best-effort fixed-delay, so an overrunning round starts the next one
//! immediately instead of compensating.

use crate::machine_logic::config::Config;
use crate::machine_logic::state::FeederState;
use lib_common::connections::db_postgres::DbError;
use lib_common::telemetry::model::AxisName;
use std::sync::atomic::Ordering;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

/// Writes the static fleet entities: one machine row per configured id,
/// then the five axis definitions per machine. Every statement is an
/// insert-or-ignore, so re-running on restart neither duplicates nor
/// errors on existing rows.
pub async fn provision(config: &Config, state: &FeederState) -> Result<(), DbError> {
    for machine_id in config.machine_ids() {
        state
            .db
            .upsert_machine(machine_id, &machine_id.to_string(), state.generator.tool_capacity)
            .await?;
    }
    tracing::info!("inserted machine info for {} machines", config.machine_count());

    for machine_id in config.machine_ids() {
        for axis_name in AxisName::ALL {
            state
                .db
                .upsert_axis(
                    machine_id,
                    axis_name,
                    state.generator.max_acceleration,
                    state.generator.max_velocity,
                )
                .await?;
        }
    }
    tracing::info!("inserted axis info for {} machines", config.machine_count());
    Ok(())
}

/// Periodic tool-sample writer. One round = one sample per machine.
pub async fn run_tool_stream(
    config: Config,
    state: FeederState,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut tick = interval(config.tool_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("tool-sample stream received shutdown signal");
                break;
            }
            _ = tick.tick() => {
                for machine_id in config.machine_ids() {
                    let sample = state.generator.tool_sample();
                    if let Err(e) = state.db.append_tool_sample(machine_id, &sample).await {
                        tracing::warn!("tool sample write failed for machine {}: {}", machine_id, e);
                    }
                }
                tracing::debug!("tool-sample round complete for {} machines", config.machine_count());
            }
        }
    }
}

/// Periodic tool-usage writer. One round = one event per machine.
pub async fn run_tool_usage_stream(
    config: Config,
    state: FeederState,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut tick = interval(config.tool_usage_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("tool-usage stream received shutdown signal");
                break;
            }
            _ = tick.tick() => {
                for machine_id in config.machine_ids() {
                    let usage = state.generator.tool_usage();
                    if let Err(e) = state.db.append_tool_usage(machine_id, &usage).await {
                        tracing::warn!("tool usage write failed for machine {}: {}", machine_id, e);
                    }
                }
                tracing::debug!("tool-usage round complete for {} machines", config.machine_count());
            }
        }
    }
}

/// Periodic axis-sample writer. One round = one sample per axis per
/// machine. A sample for an unprovisioned axis is dropped inside the
/// gateway; a failed write is logged and the round moves on.
pub async fn run_axis_stream(
    config: Config,
    state: FeederState,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut tick = interval(config.axis_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("axis-sample stream received shutdown signal");
                break;
            }
            _ = tick.tick() => {
                for machine_id in config.machine_ids() {
                    for axis_name in AxisName::ALL {
                        let sample = state.generator.axis_sample();
                        match state.db.append_axis_sample(machine_id, axis_name, &sample).await {
                            Ok(true) => {
                                state.axis_inserts.fetch_add(1, Ordering::Relaxed);
                            }
                            // Unprovisioned axis: already logged and dropped by the gateway
                            Ok(false) => {}
                            Err(e) => {
                                tracing::warn!(
                                    "axis sample write failed for machine {} axis {}: {}",
                                    machine_id,
                                    axis_name,
                                    e
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}
