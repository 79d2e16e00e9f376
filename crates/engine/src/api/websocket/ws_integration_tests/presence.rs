use super::*;

#[tokio::test]
async fn when_user_announces_then_every_connection_sees_online() {
    let state = build_test_state(Arc::new(RecordingUserStatusRepo::default()));
    let (addr, server) = spawn_ws_server(state).await;

    let mut alice_ws = ws_connect_ready(addr).await;
    let mut listener_ws = ws_connect_ready(addr).await;

    ws_announce(&mut alice_ws, "u1", "alice").await;

    let online = ws_expect_status(&mut listener_ws, "u1", PresenceStatus::Online).await;
    assert_eq!(
        online,
        ServerMessage::UserStatusChange {
            user_id: UserId::new("u1").unwrap(),
            status: PresenceStatus::Online,
        }
    );
    // The announcing connection is part of the global audience too.
    let _ = ws_expect_status(&mut alice_ws, "u1", PresenceStatus::Online).await;

    server.abort();
}

#[tokio::test]
async fn when_user_disconnects_then_offline_is_broadcast_and_user_is_not_listed() {
    let repo = Arc::new(RecordingUserStatusRepo::default());
    let state = build_test_state(repo.clone());
    let (addr, server) = spawn_ws_server(state).await;

    let mut alice_ws = ws_connect_ready(addr).await;
    let mut listener_ws = ws_connect_ready(addr).await;

    ws_announce(&mut alice_ws, "u1", "alice").await;
    let _ = ws_expect_status(&mut listener_ws, "u1", PresenceStatus::Online).await;
    assert_eq!(
        ws_online_users(&mut listener_ws).await,
        vec![UserId::new("u1").unwrap()]
    );

    alice_ws.close(None).await.unwrap();

    let _ = ws_expect_status(&mut listener_ws, "u1", PresenceStatus::Offline).await;
    assert!(ws_online_users(&mut listener_ws).await.is_empty());

    let user = UserId::new("u1").unwrap();
    assert_eq!(
        repo.writes(),
        vec![
            (user.clone(), PresenceStatus::Online),
            (user, PresenceStatus::Offline),
        ]
    );

    server.abort();
}

#[tokio::test]
async fn when_unannounced_connection_disconnects_then_no_status_change() {
    let repo = Arc::new(RecordingUserStatusRepo::default());
    let state = build_test_state(repo.clone());
    let (addr, server) = spawn_ws_server(state.clone()).await;

    let mut anonymous_ws = ws_connect_ready(addr).await;
    let mut listener_ws = ws_connect_ready(addr).await;

    anonymous_ws.close(None).await.unwrap();

    ws_expect_no_message_matching(&mut listener_ws, QUIET_PERIOD, |m| {
        matches!(m, ServerMessage::UserStatusChange { .. })
    })
    .await;
    assert!(repo.writes().is_empty());
    assert_eq!(state.connections.connection_count().await, 1);

    server.abort();
}

#[tokio::test]
async fn when_same_user_connects_twice_then_registry_keeps_one_entry() {
    let state = build_test_state(Arc::new(RecordingUserStatusRepo::default()));
    let (addr, server) = spawn_ws_server(state.clone()).await;

    let mut first_ws = ws_connect_ready(addr).await;
    let mut second_ws = ws_connect_ready(addr).await;

    ws_announce(&mut first_ws, "u1", "alice").await;
    let _ = ws_expect_status(&mut second_ws, "u1", PresenceStatus::Online).await;
    ws_announce(&mut second_ws, "u1", "alice").await;
    ws_sync(&mut second_ws).await;

    assert_eq!(
        ws_online_users(&mut first_ws).await,
        vec![UserId::new("u1").unwrap()]
    );

    // The evicted connection leaving does not take the user offline.
    first_ws.close(None).await.unwrap();
    ws_expect_no_message_matching(&mut second_ws, QUIET_PERIOD, |m| {
        matches!(
            m,
            ServerMessage::UserStatusChange {
                status: PresenceStatus::Offline,
                ..
            }
        )
    })
    .await;
    assert_eq!(
        ws_online_users(&mut second_ws).await,
        vec![UserId::new("u1").unwrap()]
    );

    server.abort();
}

#[tokio::test]
async fn when_durable_store_fails_then_presence_is_still_broadcast() {
    let mut repo = crate::infrastructure::ports::MockUserStatusRepo::new();
    repo.expect_set_status().returning(|_, _, _| {
        Err(crate::infrastructure::ports::RepoError::database(
            "user_status.set",
            "disk full",
        ))
    });
    let state = build_test_state(Arc::new(repo));
    let (addr, server) = spawn_ws_server(state).await;

    let mut alice_ws = ws_connect_ready(addr).await;
    let mut listener_ws = ws_connect_ready(addr).await;

    ws_announce(&mut alice_ws, "u1", "alice").await;
    let _ = ws_expect_status(&mut listener_ws, "u1", PresenceStatus::Online).await;

    alice_ws.close(None).await.unwrap();
    let _ = ws_expect_status(&mut listener_ws, "u1", PresenceStatus::Offline).await;

    server.abort();
}
