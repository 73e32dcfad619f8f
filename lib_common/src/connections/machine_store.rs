//! # Storage Gateway
//!
//! Write-side operations for the fleet store: idempotent upserts for the
//! static entities (machine, axis definition) and pure appends for the
//! time-varying streams (tool sample, tool-usage event, axis sample).
//!
//! Each operation is a single independent statement on a pooled
//! connection. No cross-row atomicity is provided or required across the
//! three streams.

use serde::Serialize;
use sqlx::FromRow;

use crate::connections::db_postgres::{Database, DbError};
use crate::telemetry::model::{AxisName, AxisSample, ToolSample, ToolUsage};

pub const UPSERT_MACHINE_SQL: &str = r#"
    INSERT INTO machine (machine_id, machine_name, tool_capacity)
    VALUES ($1, $2, $3)
    ON CONFLICT (machine_id) DO NOTHING
"#;

pub const UPSERT_AXIS_SQL: &str = r#"
    INSERT INTO axis (machine_id, axis_name, max_acceleration, max_velocity)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (machine_id, axis_name) DO NOTHING
"#;

const APPEND_TOOL_SQL: &str = r#"
    INSERT INTO tool (machine_id, tool_offset, feedrate)
    VALUES ($1, $2, $3)
"#;

const APPEND_TOOL_USAGE_SQL: &str = r#"
    INSERT INTO tool_usage (machine_id, tool_in_use)
    VALUES ($1, $2)
"#;

const RESOLVE_AXIS_SQL: &str = r#"
    SELECT axis_id FROM axis WHERE machine_id = $1 AND axis_name = $2
"#;

const APPEND_AXIS_DATA_SQL: &str = r#"
    INSERT INTO axis_data (axis_id, actual_position, target_position, homed, acceleration, velocity)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// A machine row. Static after provisioning.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MachineRow {
    pub machine_id: i32,
    pub machine_name: String,
    pub tool_capacity: i32,
}

/// A persisted tool sample.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ToolRow {
    pub tool_id: i32,
    pub machine_id: i32,
    pub tool_offset: f64,
    pub feedrate: f64,
    pub update_timestamp: chrono::DateTime<chrono::Utc>,
}

/// A persisted axis sample, including the store-computed `distance_to_go`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AxisDataRow {
    pub axis_data_id: i32,
    pub axis_id: i32,
    pub actual_position: f64,
    pub target_position: f64,
    pub distance_to_go: f64,
    pub homed: bool,
    pub acceleration: f64,
    pub velocity: f64,
    pub update_timestamp: chrono::DateTime<chrono::Utc>,
}

impl Database {
    /// Insert-or-ignore on the machine primary key. Never overwrites an
    /// existing row, so provisioning can re-run on every restart.
    pub async fn upsert_machine(
        &self,
        machine_id: i32,
        machine_name: &str,
        tool_capacity: i32,
    ) -> Result<(), DbError> {
        sqlx::query(UPSERT_MACHINE_SQL)
            .bind(machine_id)
            .bind(machine_name)
            .bind(tool_capacity)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_exec)?;
        Ok(())
    }

    /// Insert-or-ignore on the `(machine_id, axis_name)` uniqueness
    /// constraint; a conflict is a no-op, not an error.
    pub async fn upsert_axis(
        &self,
        machine_id: i32,
        axis_name: AxisName,
        max_acceleration: f64,
        max_velocity: f64,
    ) -> Result<(), DbError> {
        sqlx::query(UPSERT_AXIS_SQL)
            .bind(machine_id)
            .bind(axis_name.as_str())
            .bind(max_acceleration)
            .bind(max_velocity)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_exec)?;
        Ok(())
    }

    /// Pure append. An unknown machine surfaces as
    /// [`DbError::ReferentialError`] from the store's foreign key.
    pub async fn append_tool_sample(
        &self,
        machine_id: i32,
        sample: &ToolSample,
    ) -> Result<(), DbError> {
        sqlx::query(APPEND_TOOL_SQL)
            .bind(machine_id)
            .bind(sample.tool_offset)
            .bind(sample.feedrate)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_exec)?;
        Ok(())
    }

    /// Pure append. An unknown machine surfaces as
    /// [`DbError::ReferentialError`] from the store's foreign key.
    pub async fn append_tool_usage(
        &self,
        machine_id: i32,
        usage: &ToolUsage,
    ) -> Result<(), DbError> {
        sqlx::query(APPEND_TOOL_USAGE_SQL)
            .bind(machine_id)
            .bind(usage.tool_in_use)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_exec)?;
        Ok(())
    }

    /// Appends one axis sample, resolving the surrogate `axis_id` from
    /// the logical `(machine_id, axis_name)` key first.
    ///
    /// If the axis is not provisioned the sample is logged and dropped;
    /// axis definitions are expected to exist before sampling starts, so
    /// this degrades gracefully instead of failing the writer loop.
    ///
    /// Returns `true` if a row was written.
    pub async fn append_axis_sample(
        &self,
        machine_id: i32,
        axis_name: AxisName,
        sample: &AxisSample,
    ) -> Result<bool, DbError> {
        let axis_id: Option<i32> = sqlx::query_scalar(RESOLVE_AXIS_SQL)
            .bind(machine_id)
            .bind(axis_name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let Some(axis_id) = axis_id else {
            tracing::error!(
                "axis with machine_id {} and axis_name {} not found, dropping sample",
                machine_id,
                axis_name
            );
            return Ok(false);
        };

        sqlx::query(APPEND_AXIS_DATA_SQL)
            .bind(axis_id)
            .bind(sample.actual_position)
            .bind(sample.target_position)
            .bind(sample.homed)
            .bind(sample.acceleration)
            .bind(sample.velocity)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_exec)?;
        Ok(true)
    }

    /// Resolves an opaque subscriber token to an identity, if one exists.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<String>, DbError> {
        sqlx::query_scalar("SELECT username FROM access_token WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_upserts_are_conflict_tolerant() {
        assert!(UPSERT_MACHINE_SQL.contains("ON CONFLICT (machine_id) DO NOTHING"));
        assert!(UPSERT_AXIS_SQL.contains("ON CONFLICT (machine_id, axis_name) DO NOTHING"));
    }

    #[test]
    fn test_axis_append_never_writes_distance_to_go() {
        assert!(!APPEND_AXIS_DATA_SQL.contains("distance_to_go"));
    }
}
