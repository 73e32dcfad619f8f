//! # Telemetry Module
//!
//! The fleet domain model and the pure synthetic sample generators.
//! Nothing in here performs I/O; persistence lives in `connections`.

/// Module for the randomized, bounded sample generators.
pub mod generator;

/// Module for the machine / axis / tool domain types.
pub mod model;
