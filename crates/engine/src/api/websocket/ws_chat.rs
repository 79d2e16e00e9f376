use chatrelay_domain::RoomId;
use chatrelay_shared::ChatMessage;

use super::*;

pub(super) async fn handle_send_message(
    state: &WsState,
    connection_id: ConnectionId,
    message: ChatMessage,
) -> Option<ServerMessage> {
    state
        .app
        .use_cases
        .relay
        .route_message(connection_id, message)
        .await;
    None
}

pub(super) async fn handle_typing(
    state: &WsState,
    connection_id: ConnectionId,
    room: RoomId,
    username: Option<String>,
) -> Option<ServerMessage> {
    state
        .app
        .use_cases
        .relay
        .typing_started(connection_id, room, username)
        .await;
    None
}

pub(super) async fn handle_stop_typing(
    state: &WsState,
    connection_id: ConnectionId,
    room: RoomId,
) -> Option<ServerMessage> {
    state
        .app
        .use_cases
        .relay
        .typing_stopped(connection_id, room)
        .await;
    None
}
