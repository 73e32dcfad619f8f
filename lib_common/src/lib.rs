// Declare the modules to re-export
#[cfg(feature = "connections")]
pub mod connections;
#[cfg(feature = "telemetry")]
pub mod telemetry;

// Re-export the workhorse types at the crate root
#[cfg(feature = "connections")]
pub use connections::db_postgres::{Database, DbError};
#[cfg(feature = "telemetry")]
pub use telemetry::generator::TelemetryGenerator;
#[cfg(feature = "telemetry")]
pub use telemetry::model::AxisName;
