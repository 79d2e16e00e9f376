use chatrelay_domain::UserId;

use super::*;
use crate::use_cases::presence::AnnounceOutcome;

pub(super) async fn handle_join_with_data(
    state: &WsState,
    connection_id: ConnectionId,
    user_id: UserId,
    username: String,
) -> Option<ServerMessage> {
    // The status broadcast reaches this connection too, so there is no
    // direct reply. Ignored announcements are logged by the publisher.
    if let AnnounceOutcome::Published {
        replaced: Some(previous),
    } = state
        .app
        .use_cases
        .presence
        .announce_online(connection_id, user_id, username)
        .await
    {
        tracing::debug!(
            connection_id = %connection_id,
            previous_connection_id = %previous,
            "Connection took over user from an earlier connection"
        );
    }
    None
}

pub(super) async fn handle_get_online_users(
    state: &WsState,
    connection_id: ConnectionId,
) -> Option<ServerMessage> {
    let response = state.app.use_cases.relay.online_users().await;
    tracing::debug!(connection_id = %connection_id, "Answering online users request");
    Some(response)
}

pub(super) async fn handle_disconnect(state: &WsState, connection_id: ConnectionId) {
    if state
        .app
        .use_cases
        .presence
        .announce_offline(connection_id)
        .await
        .is_none()
    {
        tracing::debug!(
            connection_id = %connection_id,
            "Disconnected connection owned no user, no status change"
        );
    }
}
