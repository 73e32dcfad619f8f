//! Shared logic for the machinesim binaries: the feeder that writes the
//! synthetic telemetry streams and the WebSocket server that fans the
//! freshest values out to subscribers.

pub mod machine_logic;
