use super::*;

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::routing::get;
use chatrelay_domain::{PresenceStatus, UserId, UserPresence};
use chrono::{DateTime, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::ports::{ClockPort, RepoError, UserStatusRepo};

pub(crate) type TestWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(2);
pub(crate) const QUIET_PERIOD: Duration = Duration::from_millis(200);

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// In-memory user store that records every write in order.
#[derive(Default)]
pub(crate) struct RecordingUserStatusRepo {
    writes: Mutex<Vec<(UserId, PresenceStatus, DateTime<Utc>)>>,
}

impl RecordingUserStatusRepo {
    pub(crate) fn writes(&self) -> Vec<(UserId, PresenceStatus)> {
        let guard = self.writes.lock().unwrap();
        guard
            .iter()
            .map(|(user_id, status, _)| (user_id.clone(), *status))
            .collect()
    }
}

#[async_trait]
impl UserStatusRepo for RecordingUserStatusRepo {
    async fn set_status(
        &self,
        user_id: &UserId,
        status: PresenceStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut guard = self.writes.lock().unwrap();
        guard.push((user_id.clone(), status, last_seen));
        Ok(())
    }

    async fn get_presence(&self, user_id: &UserId) -> Result<Option<UserPresence>, RepoError> {
        let guard = self.writes.lock().unwrap();
        Ok(guard
            .iter()
            .rev()
            .find(|(id, _, _)| id == user_id)
            .map(|(id, status, last_seen)| UserPresence {
                user_id: id.clone(),
                status: *status,
                last_seen: *last_seen,
            }))
    }
}

/// Build the websocket state around `user_status` and start its presence worker.
pub(crate) fn build_test_state(user_status: Arc<dyn UserStatusRepo>) -> Arc<WsState> {
    let clock: Arc<dyn ClockPort> = Arc::new(FixedClock(fixed_now()));
    let (app, worker) = App::new(user_status, clock, Duration::from_secs(1));
    tokio::spawn(worker.run());
    Arc::new(WsState::new(Arc::new(app)))
}

pub(crate) async fn spawn_ws_server(
    state: Arc<WsState>,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(state));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> TestWs {
    let url = format!("ws://{}/ws", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

/// Connect and wait until the relay has opened the connection.
pub(crate) async fn ws_connect_ready(addr: SocketAddr) -> TestWs {
    let mut ws = ws_connect(addr).await;
    ws_sync(&mut ws).await;
    ws
}

pub(crate) async fn ws_send_client(ws: &mut TestWs, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json.into())).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut TestWs, text: &str) {
    ws.send(WsMessage::Text(text.to_string().into())).await.unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut TestWs) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerMessage>(text.as_str()).unwrap();
            }
            WsMessage::Binary(bin) => {
                let text = String::from_utf8(bin.to_vec()).unwrap();
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}

/// Round-trip a heartbeat. Frames on one connection are handled in order,
/// so everything sent before this has been processed once it returns.
pub(crate) async fn ws_sync(ws: &mut TestWs) {
    ws_send_client(ws, &ClientMessage::Heartbeat).await;
    let _ = ws_expect_message(ws, RECV_TIMEOUT, |m| matches!(m, ServerMessage::Pong)).await;
}

pub(crate) async fn ws_announce(ws: &mut TestWs, user_id: &str, username: &str) {
    ws_send_client(
        ws,
        &ClientMessage::JoinWithData {
            user_id: UserId::new(user_id).unwrap(),
            username: username.to_string(),
        },
    )
    .await;
}

pub(crate) async fn ws_join_room(ws: &mut TestWs, room_id: &str) {
    ws_send_client(
        ws,
        &ClientMessage::JoinConversation {
            room_id: chatrelay_domain::RoomId::new(room_id).unwrap(),
        },
    )
    .await;
    ws_sync(ws).await;
}

pub(crate) async fn ws_expect_status(
    ws: &mut TestWs,
    user_id: &str,
    status: PresenceStatus,
) -> ServerMessage {
    let expected = UserId::new(user_id).unwrap();
    ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(
            m,
            ServerMessage::UserStatusChange { user_id, status: s }
                if *user_id == expected && *s == status
        )
    })
    .await
}

pub(crate) async fn ws_online_users(ws: &mut TestWs) -> Vec<UserId> {
    ws_send_client(ws, &ClientMessage::GetOnlineUsers).await;
    match ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::OnlineUsersList { .. })
    })
    .await
    {
        ServerMessage::OnlineUsersList { mut user_ids } => {
            user_ids.sort();
            user_ids
        }
        other => panic!("unexpected message: {:?}", other),
    }
}
