//! WebSocket message types for relay-client communication
//!
//! Every frame is a JSON object tagged by `"type"` (snake_case), with
//! camelCase field names.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing variants requires major version bump
//! - Renaming variants is a breaking change

use chatrelay_domain::{PresenceStatus, RoomId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Client Messages (client → relay)
// =============================================================================

/// Messages from a chat client to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identity announcement; makes the user visible as online
    #[serde(rename_all = "camelCase")]
    JoinWithData { user_id: UserId, username: String },
    /// Join the delivery group of a conversation or group chat
    #[serde(rename_all = "camelCase")]
    JoinConversation { room_id: RoomId },
    /// Leave a conversation or group delivery group
    #[serde(rename_all = "camelCase")]
    LeaveConversation { room_id: RoomId },
    /// Relay a chat message to its conversation or group
    SendMessage { message: ChatMessage },
    /// Sender started typing in a room
    Typing {
        room: RoomId,
        /// Display name override; falls back to the announced username
        #[serde(default)]
        username: Option<String>,
    },
    /// Sender stopped typing in a room
    StopTyping { room: RoomId },
    /// Ask for the ids of every user currently online
    GetOnlineUsers,
    /// Keep-alive
    Heartbeat,
}

// =============================================================================
// Server Messages (relay → client)
// =============================================================================

/// Messages from the relay to a chat client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A user went online or offline (sent to every connection)
    #[serde(rename_all = "camelCase")]
    UserStatusChange {
        user_id: UserId,
        status: PresenceStatus,
    },
    /// A chat message for a room the receiver has joined
    NewMessage { message: ChatMessage },
    /// Someone else in the room is typing
    Typing {
        room: RoomId,
        #[serde(default)]
        user: Option<String>,
    },
    /// Someone else in the room stopped typing
    StopTyping { room: RoomId },
    /// Reply to `get_online_users`
    #[serde(rename_all = "camelCase")]
    OnlineUsersList { user_ids: Vec<UserId> },
    /// The sender's last frame was rejected
    Error { code: String, message: String },
    /// Reply to `heartbeat`
    Pong,
}

// =============================================================================
// Chat payload
// =============================================================================

/// A chat message as sent by a client.
///
/// Only the routing identifiers are typed; every other field is carried
/// through untouched so recipients see exactly what the sender emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ChatMessage {
    /// Room this message should be delivered to.
    ///
    /// The conversation takes precedence over the group when both are set.
    /// Blank or invalid identifiers count as absent.
    pub fn target_room(&self) -> Option<RoomId> {
        [&self.conversation_id, &self.group_id]
            .into_iter()
            .flatten()
            .find_map(|id| RoomId::new(id.as_str()).ok())
    }
}
