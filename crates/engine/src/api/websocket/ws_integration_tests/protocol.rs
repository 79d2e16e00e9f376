use super::*;

#[tokio::test]
async fn when_frame_is_malformed_then_only_sender_gets_parse_error() {
    let state = build_test_state(Arc::new(RecordingUserStatusRepo::default()));
    let (addr, server) = spawn_ws_server(state).await;

    let mut sender_ws = ws_connect_ready(addr).await;
    let mut peer_ws = ws_connect_ready(addr).await;

    ws_send_raw(&mut sender_ws, r#"{"type":"join_with_data","userId":""}"#).await;

    let error = ws_expect_message(&mut sender_ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::Error { .. })
    })
    .await;
    match error {
        ServerMessage::Error { code, .. } => assert_eq!(code, "PARSE_ERROR"),
        other => panic!("unexpected message: {:?}", other),
    }

    ws_expect_no_message_matching(&mut peer_ws, QUIET_PERIOD, |_| true).await;
    assert!(ws_online_users(&mut sender_ws).await.is_empty());

    server.abort();
}

#[tokio::test]
async fn when_unknown_event_type_then_parse_error_and_connection_stays_open() {
    let state = build_test_state(Arc::new(RecordingUserStatusRepo::default()));
    let (addr, server) = spawn_ws_server(state).await;

    let mut ws = ws_connect_ready(addr).await;
    ws_send_raw(&mut ws, r#"{"type":"self_destruct"}"#).await;

    let _ = ws_expect_message(&mut ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::Error { .. })
    })
    .await;

    // Still served after the bad frame.
    ws_sync(&mut ws).await;

    server.abort();
}

#[tokio::test]
async fn when_heartbeat_then_pong() {
    let state = build_test_state(Arc::new(RecordingUserStatusRepo::default()));
    let (addr, server) = spawn_ws_server(state).await;

    let mut ws = ws_connect(addr).await;
    ws_send_client(&mut ws, &ClientMessage::Heartbeat).await;

    assert_eq!(ws_recv_server(&mut ws).await, ServerMessage::Pong);

    server.abort();
}
