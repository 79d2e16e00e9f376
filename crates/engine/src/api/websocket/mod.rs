//! WebSocket handling for chat client connections.
//!
//! Every socket gets a [`ConnectionId`] and a bounded outbound channel.
//! Inbound frames are parsed as [`ClientMessage`] and dispatched to the
//! per-area handlers below; anything they return goes back to the sender.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chatrelay_domain::ConnectionId;
use chatrelay_shared::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

mod ws_chat;
mod ws_presence;
mod ws_rooms;

use super::connections::ConnectionManager;
use crate::app::App;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
}

impl WsState {
    pub fn new(app: Arc<App>) -> Self {
        let connections = app.connections.clone();
        Self { app, connections }
    }
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();

    // Create a bounded channel for sending messages to this client
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    state.connections.open(connection_id, tx.clone()).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server message");
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(msg) => {
                    if let Some(response) = handle_message(msg, &state, connection_id).await {
                        if tx.try_send(response).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send response, channel full or closed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    let error = ServerMessage::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = tx.try_send(error);
                }
            },
            Ok(Message::Ping(_)) => {
                let _ = tx.try_send(ServerMessage::Pong);
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up: presence first so the offline transition resolves the user,
    // then memberships, then the registry entry itself.
    ws_presence::handle_disconnect(&state, connection_id).await;
    let left = state.app.rooms.leave_all(connection_id).await;
    state.connections.close(connection_id).await;
    send_task.abort();

    tracing::info!(
        connection_id = %connection_id,
        rooms_left = left.len(),
        "WebSocket connection terminated"
    );
}

/// Dispatch a parsed client message to the appropriate handler.
async fn handle_message(
    msg: ClientMessage,
    state: &WsState,
    connection_id: ConnectionId,
) -> Option<ServerMessage> {
    match msg {
        // Connection lifecycle
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        // Presence
        ClientMessage::JoinWithData { user_id, username } => {
            ws_presence::handle_join_with_data(state, connection_id, user_id, username).await
        }
        ClientMessage::GetOnlineUsers => {
            ws_presence::handle_get_online_users(state, connection_id).await
        }

        // Rooms
        ClientMessage::JoinConversation { room_id } => {
            ws_rooms::handle_join_room(state, connection_id, room_id).await
        }
        ClientMessage::LeaveConversation { room_id } => {
            ws_rooms::handle_leave_room(state, connection_id, room_id).await
        }

        // Chat
        ClientMessage::SendMessage { message } => {
            ws_chat::handle_send_message(state, connection_id, message).await
        }
        ClientMessage::Typing { room, username } => {
            ws_chat::handle_typing(state, connection_id, room, username).await
        }
        ClientMessage::StopTyping { room } => {
            ws_chat::handle_stop_typing(state, connection_id, room).await
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
