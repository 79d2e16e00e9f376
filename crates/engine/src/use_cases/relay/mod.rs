//! Room-scoped relaying of chat messages and typing indicators.

use std::sync::Arc;

use chatrelay_domain::{ConnectionId, RoomId};
use chatrelay_shared::{ChatMessage, ServerMessage};

use crate::api::connections::ConnectionManager;
use crate::api::rooms::RoomManager;

/// Fans events out to room members and answers sender-only queries.
pub struct MessageRelay {
    connections: Arc<ConnectionManager>,
    rooms: Arc<RoomManager>,
}

impl MessageRelay {
    pub fn new(connections: Arc<ConnectionManager>, rooms: Arc<RoomManager>) -> Self {
        Self { connections, rooms }
    }

    /// Deliver to every member of `room_id` except `exclude`. Best effort:
    /// returns how many connections accepted the message.
    pub async fn broadcast_to_room(
        &self,
        room_id: &RoomId,
        exclude: Option<ConnectionId>,
        message: ServerMessage,
    ) -> usize {
        let recipients = self.rooms.recipients(room_id, exclude).await;
        if recipients.is_empty() {
            return 0;
        }
        self.connections.send_to_each(&recipients, message).await
    }

    /// Relay a chat message to its conversation, or to its group when it
    /// has no conversation. Messages with neither are dropped.
    pub async fn route_message(
        &self,
        sender: ConnectionId,
        message: ChatMessage,
    ) -> Option<RoomId> {
        let Some(room_id) = message.target_room() else {
            tracing::debug!(
                connection_id = %sender,
                "Dropping message without conversation or group"
            );
            return None;
        };

        let delivered = self
            .broadcast_to_room(&room_id, Some(sender), ServerMessage::NewMessage { message })
            .await;
        tracing::debug!(
            connection_id = %sender,
            room_id = %room_id,
            delivered,
            "Relayed message"
        );
        Some(room_id)
    }

    /// Tell the rest of the room the sender is typing. Without an explicit
    /// name (missing or blank) the username announced on the connection is
    /// used.
    pub async fn typing_started(
        &self,
        sender: ConnectionId,
        room_id: RoomId,
        username: Option<String>,
    ) -> usize {
        let user = match username.filter(|name| !name.trim().is_empty()) {
            Some(name) => Some(name),
            None => self.connections.username(sender).await,
        };
        let message = ServerMessage::Typing {
            room: room_id.clone(),
            user,
        };
        self.broadcast_to_room(&room_id, Some(sender), message).await
    }

    /// Tell the rest of the room the sender stopped typing.
    pub async fn typing_stopped(&self, sender: ConnectionId, room_id: RoomId) -> usize {
        let message = ServerMessage::StopTyping {
            room: room_id.clone(),
        };
        self.broadcast_to_room(&room_id, Some(sender), message).await
    }

    /// Reply to a `get_online_users` request.
    pub async fn online_users(&self) -> ServerMessage {
        ServerMessage::OnlineUsersList {
            user_ids: self.connections.list_active_users().await,
        }
    }
}
