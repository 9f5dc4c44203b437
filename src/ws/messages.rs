//! Pad WebSocket message types: envelope and client commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::joystick::PadInput;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-originated envelope stamped now.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an event envelope with a fresh id.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload)
    }

    /// Builds an error envelope answering `id`.
    #[must_use]
    pub fn error(id: String, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }

    /// Serializes to a JSON text frame.
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Command payloads a pad client can send.
#[derive(Debug, Clone, PartialEq)]
pub enum PadCommand {
    /// Joystick input for this connection's session.
    Input(PadInput),
    /// Keyboard key press.
    Key(String),
}

#[derive(Deserialize)]
struct KeyPayload {
    key: String,
}

impl PadCommand {
    /// Reads a command payload. `{"op": "key", "key": ...}` is a key
    /// press; every other `op` is joystick input.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error for payloads matching neither.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if payload.get("op").and_then(serde_json::Value::as_str) == Some("key") {
            let KeyPayload { key } = KeyPayload::deserialize(payload)?;
            Ok(Self::Key(key))
        } else {
            PadInput::deserialize(payload).map(Self::Input)
        }
    }
}
