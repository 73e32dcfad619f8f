//! # Snapshot Resolvers
//!
//! Read-side "latest row per logical key" projections over the three
//! live streams. Selection is done by a correlated most-recent-timestamp
//! subquery inside the store, not by resolver-side ordering, so the
//! result holds under concurrent writers. Timestamp ties are broken by
//! the highest surrogate id; writers are never assumed to be ordered.

use crate::connections::db_postgres::{Database, DbError};
use crate::connections::machine_store::{AxisDataRow, MachineRow, ToolRow};

/// Machines are static, so the machine projection is simply all rows.
pub const LATEST_MACHINES_SQL: &str = "SELECT * FROM machine ORDER BY machine_id";

/// One tool row per machine: the row whose id the correlated subquery
/// picks as most recent (timestamp, then surrogate id) for that machine.
pub const LATEST_TOOL_SQL: &str = r#"
    SELECT * FROM tool t
    WHERE t.tool_id = (
        SELECT t2.tool_id FROM tool t2
        WHERE t2.machine_id = t.machine_id
        ORDER BY t2.update_timestamp DESC, t2.tool_id DESC
        LIMIT 1
    )
    ORDER BY t.machine_id
"#;

/// One axis_data row per axis, same selection shape as the tool stream.
pub const LATEST_AXIS_DATA_SQL: &str = r#"
    SELECT * FROM axis_data d
    WHERE d.axis_data_id = (
        SELECT d2.axis_data_id FROM axis_data d2
        WHERE d2.axis_id = d.axis_id
        ORDER BY d2.update_timestamp DESC, d2.axis_data_id DESC
        LIMIT 1
    )
    ORDER BY d.axis_id
"#;

impl Database {
    /// All machine rows. An empty fleet yields an empty vector.
    pub async fn latest_machines(&self) -> Result<Vec<MachineRow>, DbError> {
        sqlx::query_as::<_, MachineRow>(LATEST_MACHINES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// The freshest tool sample for every machine present in the tool
    /// table. Machines that never produced a sample are absent.
    pub async fn latest_tool_samples(&self) -> Result<Vec<ToolRow>, DbError> {
        sqlx::query_as::<_, ToolRow>(LATEST_TOOL_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// The freshest axis sample for every axis present in axis_data.
    pub async fn latest_axis_samples(&self) -> Result<Vec<AxisDataRow>, DbError> {
        sqlx::query_as::<_, AxisDataRow>(LATEST_AXIS_DATA_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projections_tie_break_on_surrogate_id() {
        assert!(LATEST_TOOL_SQL.contains("ORDER BY t2.update_timestamp DESC, t2.tool_id DESC"));
        assert!(
            LATEST_AXIS_DATA_SQL
                .contains("ORDER BY d2.update_timestamp DESC, d2.axis_data_id DESC")
        );
    }

    #[test]
    fn test_projections_are_correlated_per_key() {
        assert!(LATEST_TOOL_SQL.contains("WHERE t2.machine_id = t.machine_id"));
        assert!(LATEST_AXIS_DATA_SQL.contains("WHERE d2.axis_id = d.axis_id"));
    }
}
