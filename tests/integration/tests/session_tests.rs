//! Chat session integration tests over a real WebSocket
//!
//! Run with: cargo test -p integration-tests --test session_tests

use std::sync::Arc;

use chat_client::{ChatSession, ConnectionState, DeliveryError, WsTransportFactory};
use chat_common::MemoryCredentialStore;
use chat_core::{CredentialStore, REFRESHED_TOKEN_KEY};
use integration_tests::{
    drive_until, new_chatter, remove_chatter, MockChatServer, REFRESHED_TOKEN, TEST_TOKEN, TEST_USER,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;

type WsSession = ChatSession<WsTransportFactory, MemoryCredentialStore>;

fn session_for(server: &MockChatServer, token: &str) -> (WsSession, MemoryCredentialStore) {
    let store = MemoryCredentialStore::with_token(token);
    let session = ChatSession::new(WsTransportFactory::new(server.ws_url()), store.clone());
    (session, store)
}

/// Connect and wait for the server's greeting to land
async fn connected(server: &MockChatServer) -> (WsSession, MemoryCredentialStore) {
    let (mut session, store) = session_for(server, TEST_TOKEN);
    session.connect().unwrap();
    drive_until(&mut session, |s| s.presence().contains(TEST_USER))
        .await
        .unwrap();
    (session, store)
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_presence() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = session_for(&server, TEST_TOKEN);

    let presence = Arc::new(Mutex::new(Vec::new()));
    let sink = presence.clone();
    session.on_presence(move |users, lurkers| sink.lock().push((users.to_vec(), lurkers)));

    session.connect().unwrap();
    assert_eq!(session.state(), ConnectionState::Connecting);

    drive_until(&mut session, |s| s.state() == ConnectionState::Connected)
        .await
        .unwrap();
    assert_eq!(session.retry_count(), 0);

    drive_until(&mut session, |s| !s.presence().is_empty()).await.unwrap();
    assert_eq!(*presence.lock(), vec![(vec![TEST_USER.to_string()], 0)]);
}

#[tokio::test]
async fn test_rejected_handshake_leaves_session_disconnected() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = session_for(&server, "bogus");

    session.connect().unwrap();
    drive_until(&mut session, |s| s.state() == ConnectionState::Disconnected)
        .await
        .unwrap();

    assert!(!session.is_connected());
    assert!(session.send_message("hello").is_err());
    assert!(session.last_sent().is_none());
}

#[tokio::test]
async fn test_retry_connection_reconnects() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, store) = session_for(&server, "bogus");

    session.connect().unwrap();
    drive_until(&mut session, |s| s.state() == ConnectionState::Disconnected)
        .await
        .unwrap();

    // Fix the credentials, then let the scheduled attempt pick them up
    store.set(chat_core::AUTH_TOKEN_KEY, TEST_TOKEN.to_string());
    session.disconnect().unwrap();
    session.retry_connection().unwrap();
    assert_eq!(session.retry_count(), 1);

    drive_until(&mut session, |s| s.state() == ConnectionState::Connected)
        .await
        .unwrap();
    assert_eq!(session.retry_count(), 0);
}

#[tokio::test]
async fn test_disconnect_closes_socket() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = connected(&server).await;

    session.disconnect().unwrap();

    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(!session.is_connected());
    assert!(session.presence().is_empty());
    assert!(session.is_idle());
}

// ============================================================================
// Messaging Tests
// ============================================================================

#[tokio::test]
async fn test_send_message_is_acknowledged_and_broadcast() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = connected(&server).await;

    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    session.on_message(move |payload| {
        if let Some(message) = &payload.message {
            sink.lock().push(message.clone());
        }
    });

    let (tx, rx) = oneshot::channel();
    session
        .send_message_with_ack("hello", move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    drive_until(&mut session, |s| s.pending_acks() == 0).await.unwrap();
    assert_eq!(rx.await.unwrap(), Ok(()));

    let line = format!("{TEST_USER}: hello");
    drive_until(&mut session, |_| lines.lock().contains(&line)).await.unwrap();

    let frame = server.wait_for_frame("send_message").await.unwrap();
    assert_eq!(frame.data, json!({"message": "hello", "token": TEST_TOKEN}));
    assert!(frame.ack.is_some());
}

#[tokio::test]
async fn test_resend_with_refreshed_token() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, store) = connected(&server).await;
    session.send_message("hello").unwrap();

    // A token the server does not accept is reported through the ack
    store.set(REFRESHED_TOKEN_KEY, "expired".to_string());
    let (tx, rx) = oneshot::channel();
    session.retry_send_message().unwrap();
    session
        .send_message_with_ack("again", move |result| {
            let _ = tx.send(result);
        })
        .unwrap();
    drive_until(&mut session, |s| s.pending_acks() == 0).await.unwrap();
    assert_eq!(
        rx.await.unwrap(),
        Err(DeliveryError::Rejected("Invalid token".to_string()))
    );

    store.set(REFRESHED_TOKEN_KEY, REFRESHED_TOKEN.to_string());
    session.retry_send_message().unwrap();
    assert_eq!(session.last_sent(), Some("again"));
    drive_until(&mut session, |s| s.pending_acks() == 0).await.unwrap();

    let frames = server.frames();
    let last = frames.last().unwrap();
    assert_eq!(last.data["token"], REFRESHED_TOKEN);
    assert_eq!(last.data["message"], "again");
}

#[tokio::test]
async fn test_typing_event_reaches_server() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = connected(&server).await;

    assert!(session.notify_local_input());
    assert!(!session.notify_local_input());

    let frame = server.wait_for_frame("typing_event").await.unwrap();
    assert_eq!(frame.data, json!({"type": "user", "duration": 3}));
    assert!(frame.ack.is_none());
}

// ============================================================================
// Server Push Tests
// ============================================================================

#[tokio::test]
async fn test_presence_follows_server_broadcasts() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = connected(&server).await;

    server.push_event("broadcast_message", new_chatter("alice", 3)).unwrap();
    drive_until(&mut session, |s| s.presence().contains("alice")).await.unwrap();
    assert_eq!(session.presence().users(), ["alice", TEST_USER]);
    assert_eq!(session.presence().lurkers(), 1);

    server.push_event("broadcast_message", remove_chatter("alice", 3)).unwrap();
    drive_until(&mut session, |s| !s.presence().contains("alice")).await.unwrap();
    assert_eq!(session.presence().total(), 2);
}

#[tokio::test]
async fn test_typing_indicators_from_server() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = connected(&server).await;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    session.on_typing(move |human, agent| sink.lock().push((human, agent)));

    server.push_event("typing_event", json!({"type": "robot"})).unwrap();
    drive_until(&mut session, |s| s.typing().is_agent_typing()).await.unwrap();

    server
        .push_event("typing_event", json!({"type": "user", "duration": 0.2}))
        .unwrap();
    drive_until(&mut session, |s| s.typing().is_human_typing()).await.unwrap();

    // The short human indicator runs out first
    drive_until(&mut session, |s| !s.typing().is_human_typing()).await.unwrap();
    assert!(session.typing().is_agent_typing());
    assert_eq!(*calls.lock(), vec![(false, true), (true, true), (false, true)]);
}

#[tokio::test]
async fn test_robot_refresh_request() {
    let server = MockChatServer::start().await.unwrap();
    let (mut session, _store) = connected(&server).await;

    let refreshes = Arc::new(Mutex::new(0));
    let sink = refreshes.clone();
    session.on_agent_list(move || *sink.lock() += 1);

    server
        .push_event("system_message", json!({"event": "refresh_robots"}))
        .unwrap();
    drive_until(&mut session, |_| *refreshes.lock() == 1).await.unwrap();
}
