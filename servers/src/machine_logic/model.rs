use lib_common::connections::machine_store::{AxisDataRow, MachineRow, ToolRow};
use serde::{Deserialize, Serialize};

/// Inbound subscriber messages. The `type` tag is validated at the
/// boundary; anything unrecognized fails to parse and earns an `error`
/// reply instead of a connection drop.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Authenticate { token: String },
    GetMachineData,
    GetToolData,
    GetAxisData,
}

/// Outbound subscriber messages.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    MachineData { data: Vec<MachineRow> },
    ToolData { data: Vec<ToolRow> },
    AxisData { data: Vec<AxisDataRow> },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_authenticate_with_token() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "authenticate", "token": "abc123"}"#).unwrap();
        match msg {
            ClientMessage::Authenticate { token } => assert_eq!(token, "abc123"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_parses_on_demand_queries() {
        for (raw, expect) in [
            (r#"{"type": "get_machine_data"}"#, "GetMachineData"),
            (r#"{"type": "get_tool_data"}"#, "GetToolData"),
            (r#"{"type": "get_axis_data"}"#, "GetAxisData"),
        ] {
            let msg: ClientMessage = serde_json::from_str(raw).unwrap();
            assert_eq!(format!("{msg:?}"), expect);
        }
    }

    #[test]
    fn test_rejects_unknown_type_tag() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "subscribe"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"nope": 1}"#).is_err());
    }

    #[test]
    fn test_outbound_error_carries_tag_and_message() {
        let json = serde_json::to_value(ServerMessage::error("Invalid token")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "Invalid token");
    }

    #[test]
    fn test_outbound_data_messages_carry_tags() {
        let json = serde_json::to_value(ServerMessage::MachineData { data: vec![] }).unwrap();
        assert_eq!(json["type"], "machine_data");
        assert!(json["data"].as_array().unwrap().is_empty());

        let json = serde_json::to_value(ServerMessage::ToolData { data: vec![] }).unwrap();
        assert_eq!(json["type"], "tool_data");

        let json = serde_json::to_value(ServerMessage::AxisData { data: vec![] }).unwrap();
        assert_eq!(json["type"], "axis_data");
    }
}
