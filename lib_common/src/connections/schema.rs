//! # Schema Bootstrap
//!
//! Idempotent DDL for the fleet store. Every statement is
//! `IF NOT EXISTS`, so the bootstrap is safe to re-run on each process
//! restart; the feeder executes it before provisioning starts.
//!
//! All kinematic and tool quantities are stored as `DOUBLE PRECISION`,
//! mirroring the `f64` generation side. `distance_to_go` exists only as
//! a generated column; it can never be written independently.

use crate::connections::db_postgres::{Database, DbError};

/// Ordered DDL statements for the fleet schema.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // Static fleet entities
    r#"
    CREATE TABLE IF NOT EXISTS machine (
        machine_id INT PRIMARY KEY,
        machine_name VARCHAR(255) NOT NULL,
        tool_capacity INT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS axis (
        axis_id SERIAL PRIMARY KEY,
        machine_id INT REFERENCES machine(machine_id) ON DELETE CASCADE,
        axis_name VARCHAR(255) NOT NULL CHECK (axis_name IN ('X', 'Y', 'Z', 'A', 'C')),
        max_acceleration DOUBLE PRECISION NOT NULL,
        max_velocity DOUBLE PRECISION NOT NULL,
        UNIQUE (machine_id, axis_name)
    )
    "#,
    // Append-only time series
    r#"
    CREATE TABLE IF NOT EXISTS tool (
        tool_id SERIAL PRIMARY KEY,
        machine_id INT REFERENCES machine(machine_id) ON DELETE CASCADE,
        tool_offset DOUBLE PRECISION NOT NULL,
        feedrate DOUBLE PRECISION NOT NULL,
        update_timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tool_usage (
        usage_id SERIAL PRIMARY KEY,
        machine_id INT REFERENCES machine(machine_id) ON DELETE CASCADE,
        tool_in_use INT NOT NULL,
        update_timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS axis_data (
        axis_data_id SERIAL PRIMARY KEY,
        axis_id INT REFERENCES axis(axis_id) ON DELETE CASCADE,
        actual_position DOUBLE PRECISION NOT NULL,
        target_position DOUBLE PRECISION NOT NULL,
        distance_to_go DOUBLE PRECISION GENERATED ALWAYS AS (target_position - actual_position) STORED,
        homed BOOLEAN NOT NULL,
        acceleration DOUBLE PRECISION NOT NULL,
        velocity DOUBLE PRECISION NOT NULL,
        update_timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Token -> identity lookup for subscriber authentication.
    // Issuance is handled elsewhere; this side only reads it.
    r#"
    CREATE TABLE IF NOT EXISTS access_token (
        token TEXT PRIMARY KEY,
        username TEXT NOT NULL
    )
    "#,
    // Indexes backing the latest-per-key resolution queries
    "CREATE INDEX IF NOT EXISTS idx_axis_machine_id ON axis (machine_id)",
    "CREATE INDEX IF NOT EXISTS idx_axis_data_axis_id ON axis_data (axis_id)",
];

/// Creates every table and index the simulator needs, in order.
pub async fn ensure_schema(db: &Database) -> Result<(), DbError> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(&db.pool)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
    }
    tracing::info!("schema bootstrap complete ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent_ddl() {
        for statement in SCHEMA_STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "not idempotent: {statement}");
        }
    }

    #[test]
    fn test_distance_to_go_is_generated() {
        let axis_data = SCHEMA_STATEMENTS
            .iter()
            .find(|s| s.contains("axis_data"))
            .unwrap();
        assert!(axis_data.contains("GENERATED ALWAYS AS (target_position - actual_position) STORED"));
    }

    #[test]
    fn test_time_series_cascade_on_machine_delete() {
        for table in ["tool", "tool_usage"] {
            let ddl = SCHEMA_STATEMENTS
                .iter()
                .find(|s| s.contains(&format!("EXISTS {table} ")))
                .unwrap();
            assert!(ddl.contains("ON DELETE CASCADE"));
        }
    }
}
