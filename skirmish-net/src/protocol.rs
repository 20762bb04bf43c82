//! JSON wire protocol for the game socket.
//!
//! Every frame is a JSON object with a `type` discriminator:
//! ```text
//! client → server   {"type":"join_game","gameId":"g-17"}
//!                   {"type":"heartbeat"}
//!                   {...action payload, forwarded verbatim...}
//! server → client   tick_state | events | announcement | error | game_over
//! ```
//!
//! Inbound tags outside the closed set decode to [`ServerMessage::Unknown`]
//! and are only visible to subscribers, through the raw JSON value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NetError;

/// Game id used by the pre-match lobby socket.
pub const LOBBY_GAME_ID: &str = "lobby";

/// Returns true if `game_id` names the lobby channel rather than a match.
pub fn is_lobby(game_id: &str) -> bool {
    game_id == LOBBY_GAME_ID
}

/// Control messages understood by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Attach this connection to a match session
    JoinGame {
        #[serde(rename = "gameId")]
        game_id: String,
    },
    /// Liveness ping; the server answers with an announcement
    Heartbeat,
}

/// Messages sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Control(ControlMessage),
    /// Gameplay action, sent as-is
    Action(Value),
}

impl ClientMessage {
    pub fn join_game(game_id: impl Into<String>) -> Self {
        Self::Control(ControlMessage::JoinGame {
            game_id: game_id.into(),
        })
    }

    pub fn heartbeat() -> Self {
        Self::Control(ControlMessage::Heartbeat)
    }

    pub fn action(payload: Value) -> Self {
        Self::Action(payload)
    }

    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String, NetError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One simulation snapshot. `full` distinguishes a keyframe from a delta;
/// the remaining fields are opaque to this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    #[serde(default)]
    pub full: bool,
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

/// Discrete gameplay event record (kill, pickup, objective, ...).
pub type GameEvent = Value;

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    TickState(TickSnapshot),
    Events {
        #[serde(default)]
        events: Vec<GameEvent>,
    },
    /// Free text; also acknowledges a heartbeat
    Announcement {
        #[serde(alias = "message")]
        text: String,
    },
    Error {
        #[serde(default)]
        code: String,
        message: String,
    },
    GameOver {
        #[serde(default)]
        winner: Option<String>,
        #[serde(default)]
        stats: Value,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode an already-parsed JSON value. Anything that does not match the
    /// closed tag set (including a known tag with a malformed body) becomes
    /// `Unknown`.
    pub fn from_value(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or(Self::Unknown)
    }
}

/// A parsed inbound frame, as handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub message: ServerMessage,
    /// The frame exactly as received
    pub raw: Value,
}

impl InboundMessage {
    /// Parse a text frame. Fails only when the frame is not JSON.
    pub fn parse(text: &str) -> Result<Self, NetError> {
        let raw: Value = serde_json::from_str(text)?;
        let message = ServerMessage::from_value(&raw);
        Ok(Self { message, raw })
    }

    /// The raw `type` field, if present.
    pub fn raw_type(&self) -> Option<&str> {
        self.raw.get("type").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_control_messages_wire_shape() {
        let join = ClientMessage::join_game("g-17").encode().unwrap();
        let parsed: Value = serde_json::from_str(&join).unwrap();
        assert_eq!(parsed, json!({"type": "join_game", "gameId": "g-17"}));

        let heartbeat = ClientMessage::heartbeat().encode().unwrap();
        assert_eq!(heartbeat, r#"{"type":"heartbeat"}"#);
    }

    #[test]
    fn test_action_forwarded_verbatim() {
        let payload = json!({"type": "action", "kind": "move", "x": 4, "y": -2});
        let encoded = ClientMessage::action(payload.clone()).encode().unwrap();
        let parsed: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_tick_state_keeps_opaque_fields() {
        let inbound = InboundMessage::parse(
            r#"{"type":"tick_state","tick":42,"full":true,"heroes":[{"id":"p1"}]}"#,
        )
        .unwrap();
        match inbound.message {
            ServerMessage::TickState(snapshot) => {
                assert_eq!(snapshot.tick, 42);
                assert!(snapshot.full);
                assert_eq!(snapshot.state["heroes"][0]["id"], "p1");
                assert!(!snapshot.state.contains_key("type"));
            }
            other => panic!("expected tick_state, got {other:?}"),
        }
    }

    #[test]
    fn test_tick_state_defaults_to_delta() {
        let inbound = InboundMessage::parse(r#"{"type":"tick_state","tick":7}"#).unwrap();
        assert!(matches!(
            inbound.message,
            ServerMessage::TickState(TickSnapshot { tick: 7, full: false, .. })
        ));
    }

    #[test]
    fn test_error_and_game_over() {
        let err = InboundMessage::parse(
            r#"{"type":"error","code":"NOT_IN_GAME","message":"unknown session"}"#,
        )
        .unwrap();
        assert_eq!(
            err.message,
            ServerMessage::Error {
                code: "NOT_IN_GAME".into(),
                message: "unknown session".into(),
            }
        );

        let over = InboundMessage::parse(
            r#"{"type":"game_over","winner":"blue","stats":{"kills":12}}"#,
        )
        .unwrap();
        match over.message {
            ServerMessage::GameOver { winner, stats } => {
                assert_eq!(winner.as_deref(), Some("blue"));
                assert_eq!(stats["kills"], 12);
            }
            other => panic!("expected game_over, got {other:?}"),
        }
    }

    #[test]
    fn test_announcement_accepts_message_alias() {
        let inbound =
            InboundMessage::parse(r#"{"type":"announcement","message":"pong"}"#).unwrap();
        assert_eq!(
            inbound.message,
            ServerMessage::Announcement { text: "pong".into() }
        );
    }

    #[test]
    fn test_unknown_tag_keeps_raw() {
        let inbound =
            InboundMessage::parse(r#"{"type":"match_found","lobbyId":"L1"}"#).unwrap();
        assert_eq!(inbound.message, ServerMessage::Unknown);
        assert_eq!(inbound.raw_type(), Some("match_found"));
        assert_eq!(inbound.raw["lobbyId"], "L1");
    }

    #[test]
    fn test_malformed_known_tag_is_unknown() {
        // tick_state without a tick number
        let inbound = InboundMessage::parse(r#"{"type":"tick_state","tick":"soon"}"#).unwrap();
        assert_eq!(inbound.message, ServerMessage::Unknown);
    }

    #[test]
    fn test_non_json_frame_is_error() {
        assert!(InboundMessage::parse("not json {").is_err());
    }

    #[test]
    fn test_lobby_sentinel() {
        assert!(is_lobby("lobby"));
        assert!(!is_lobby("g-17"));
    }
}
