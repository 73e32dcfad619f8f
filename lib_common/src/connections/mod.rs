//! # Connections Module
//!
//! This module handles the persistent connection to the relational store
//! and everything that talks to it: pool management, schema bootstrap,
//! the write-side storage gateway and the read-side snapshot resolvers.

/// Module for PostgreSQL database connection pooling and management.
pub mod db_postgres;

/// Module for the append/upsert storage gateway and its row types.
pub mod machine_store;

/// Module for the idempotent schema bootstrap.
pub mod schema;

/// Module for the latest-per-key snapshot resolvers.
pub mod snapshot;
