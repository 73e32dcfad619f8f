//! # Synthetic Telemetry Generator
//!
//! Produces randomized but bounded samples for the axis, tool and
//! tool-usage streams. Every call draws from the thread-local RNG, so
//! the generator is stateless per call and safe to share across the
//! concurrent writer loops.
//!
//! The kinematic bounds are intentionally independent of the static
//! per-axis `max_acceleration` / `max_velocity` limits used at
//! provisioning time. A sample can therefore exceed the plate limits of
//! its axis; consumers must not assume physical consistency.

use rand::Rng;

use crate::telemetry::model::{AxisSample, ToolSample, ToolUsage};

/// Position band for actual positions, symmetric around zero (mm).
pub const POSITION_BOUND: f64 = 190.0;
/// Target positions get a one-unit asymmetric upper extension.
pub const TARGET_UPPER_BOUND: f64 = 191.0;
/// Sampled acceleration band (mm/s^2).
pub const ACCELERATION_BOUND: f64 = 150.0;
/// Sampled velocity band (mm/s).
pub const VELOCITY_BOUND: f64 = 80.0;
/// Tool offset band (mm).
pub const TOOL_OFFSET_MIN: f64 = 5.0;
pub const TOOL_OFFSET_MAX: f64 = 40.0;
/// Feedrate band (mm/min).
pub const FEEDRATE_MAX: f64 = 20_000.0;

/// Sample factory for one simulated fleet.
///
/// Carries the static plate values handed to provisioning (axis limits,
/// tool capacity); the per-sample draws never read mutable state.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryGenerator {
    /// Static axis limit written to every axis definition row.
    pub max_acceleration: f64,
    /// Static axis limit written to every axis definition row.
    pub max_velocity: f64,
    /// Number of tool slots per machine; bounds `tool_in_use`.
    pub tool_capacity: i32,
}

impl TelemetryGenerator {
    pub fn new(max_acceleration: f64, max_velocity: f64, tool_capacity: i32) -> Self {
        Self {
            max_acceleration,
            max_velocity,
            tool_capacity,
        }
    }

    /// One kinematic sample for any axis.
    pub fn axis_sample(&self) -> AxisSample {
        let mut rng = rand::rng();
        AxisSample {
            actual_position: rng.random_range(-POSITION_BOUND..POSITION_BOUND),
            target_position: rng.random_range(-POSITION_BOUND..TARGET_UPPER_BOUND),
            homed: rng.random_bool(0.5),
            acceleration: rng.random_range(0.0..ACCELERATION_BOUND),
            velocity: rng.random_range(0.0..VELOCITY_BOUND),
        }
    }

    /// One tool-state sample.
    pub fn tool_sample(&self) -> ToolSample {
        let mut rng = rand::rng();
        ToolSample {
            tool_offset: rng.random_range(TOOL_OFFSET_MIN..TOOL_OFFSET_MAX),
            feedrate: rng.random_range(0.0..FEEDRATE_MAX),
        }
    }

    /// One tool-in-use event, uniform over the machine's tool slots.
    pub fn tool_usage(&self) -> ToolUsage {
        let mut rng = rand::rng();
        ToolUsage {
            tool_in_use: rng.random_range(1..=self.tool_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TelemetryGenerator {
        TelemetryGenerator::new(200.0, 60.0, 24)
    }

    #[test]
    fn test_axis_sample_within_bounds() {
        let generator = generator();
        for _ in 0..1000 {
            let s = generator.axis_sample();
            assert!(s.actual_position >= -POSITION_BOUND && s.actual_position < POSITION_BOUND);
            assert!(s.target_position >= -POSITION_BOUND && s.target_position < TARGET_UPPER_BOUND);
            assert!(s.acceleration >= 0.0 && s.acceleration < ACCELERATION_BOUND);
            assert!(s.velocity >= 0.0 && s.velocity < VELOCITY_BOUND);
        }
    }

    #[test]
    fn test_tool_sample_within_bounds() {
        let generator = generator();
        for _ in 0..1000 {
            let s = generator.tool_sample();
            assert!(s.tool_offset >= TOOL_OFFSET_MIN && s.tool_offset < TOOL_OFFSET_MAX);
            assert!(s.feedrate >= 0.0 && s.feedrate < FEEDRATE_MAX);
        }
    }

    #[test]
    fn test_tool_usage_respects_capacity() {
        let generator = generator();
        for _ in 0..1000 {
            let u = generator.tool_usage();
            assert!((1..=generator.tool_capacity).contains(&u.tool_in_use));
        }
    }

    #[test]
    fn test_tool_usage_capacity_of_one() {
        let generator = TelemetryGenerator::new(200.0, 60.0, 1);
        for _ in 0..10 {
            assert_eq!(generator.tool_usage().tool_in_use, 1);
        }
    }
}
