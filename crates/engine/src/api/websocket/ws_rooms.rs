use chatrelay_domain::RoomId;

use super::*;

pub(super) async fn handle_join_room(
    state: &WsState,
    connection_id: ConnectionId,
    room_id: RoomId,
) -> Option<ServerMessage> {
    let added = state.app.rooms.join(connection_id, room_id.clone()).await;
    tracing::debug!(
        connection_id = %connection_id,
        room_id = %room_id,
        added,
        "Joined room"
    );
    None
}

pub(super) async fn handle_leave_room(
    state: &WsState,
    connection_id: ConnectionId,
    room_id: RoomId,
) -> Option<ServerMessage> {
    let removed = state.app.rooms.leave(connection_id, &room_id).await;
    tracing::debug!(
        connection_id = %connection_id,
        room_id = %room_id,
        removed,
        "Left room"
    );
    None
}
