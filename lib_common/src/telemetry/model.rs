use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed axis set every simulated machine carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisName {
    X,
    Y,
    Z,
    A,
    C,
}

impl AxisName {
    /// All axes, in provisioning order.
    pub const ALL: [AxisName; 5] = [
        AxisName::X,
        AxisName::Y,
        AxisName::Z,
        AxisName::A,
        AxisName::C,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisName::X => "X",
            AxisName::Y => "Y",
            AxisName::Z => "Z",
            AxisName::A => "A",
            AxisName::C => "C",
        }
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown axis name: {0}")]
pub struct ParseAxisNameError(pub String);

impl FromStr for AxisName {
    type Err = ParseAxisNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(AxisName::X),
            "Y" => Ok(AxisName::Y),
            "Z" => Ok(AxisName::Z),
            "A" => Ok(AxisName::A),
            "C" => Ok(AxisName::C),
            other => Err(ParseAxisNameError(other.to_string())),
        }
    }
}

/// One kinematic sample for a single axis.
///
/// `distance_to_go` is not a field: the store derives it as a generated
/// column, so the only authoritative definition is `target - actual`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSample {
    pub actual_position: f64,
    pub target_position: f64,
    pub homed: bool,
    pub acceleration: f64,
    pub velocity: f64,
}

impl AxisSample {
    /// Remaining travel for this sample, matching the stored generated column.
    pub fn distance_to_go(&self) -> f64 {
        self.target_position - self.actual_position
    }
}

/// One tool-state sample for a machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolSample {
    pub tool_offset: f64,
    pub feedrate: f64,
}

/// One tool-in-use event for a machine. The index is 1-based and bounded
/// by the machine's tool capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub tool_in_use: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_name_roundtrip() {
        for axis in AxisName::ALL {
            assert_eq!(axis.as_str().parse::<AxisName>().unwrap(), axis);
        }
    }

    #[test]
    fn test_axis_name_rejects_unknown() {
        assert!("B".parse::<AxisName>().is_err());
        assert!("x".parse::<AxisName>().is_err());
        assert!("".parse::<AxisName>().is_err());
    }

    #[test]
    fn test_axis_name_wire_form_is_single_letter() {
        assert_eq!(serde_json::to_string(&AxisName::X).unwrap(), "\"X\"");
        assert_eq!(
            serde_json::from_str::<AxisName>("\"C\"").unwrap(),
            AxisName::C
        );
    }

    #[test]
    fn test_distance_to_go_is_exact_difference() {
        let sample = AxisSample {
            actual_position: -12.5,
            target_position: 30.25,
            homed: true,
            acceleration: 10.0,
            velocity: 5.0,
        };
        assert_eq!(sample.distance_to_go(), 30.25 - (-12.5));
    }
}
