//! REST client integration tests
//!
//! Run with: cargo test -p integration-tests --test api_tests

use chat_api::{ApiClient, ApiError};
use chat_common::MemoryCredentialStore;
use chat_core::CredentialStore;
use integration_tests::{MockChatServer, TEST_EMAIL, TEST_PASSWORD, TEST_TOKEN};

async fn setup(store: MemoryCredentialStore) -> (MockChatServer, ApiClient<MemoryCredentialStore>) {
    let server = MockChatServer::start().await.expect("Failed to start server");
    let client = ApiClient::new(server.base_url(), store).expect("Failed to build client");
    (server, client)
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_stores_token() {
    let store = MemoryCredentialStore::new();
    let (server, client) = setup(store.clone()).await;

    let token = client.login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

    assert_eq!(token, TEST_TOKEN);
    assert_eq!(store.auth_token().as_deref(), Some(TEST_TOKEN));
    assert_eq!(server.auth_calls(), 1);
}

#[tokio::test]
async fn test_login_rejected() {
    let store = MemoryCredentialStore::new();
    let (_server, client) = setup(store.clone()).await;

    let result = client.login(TEST_EMAIL, "wrong").await;

    assert!(matches!(result, Err(ApiError::Rejected(msg)) if msg == "Invalid credentials"));
    assert!(store.auth_token().is_none());
}

#[tokio::test]
async fn test_login_retries_server_errors() {
    let (server, client) = setup(MemoryCredentialStore::new()).await;
    server.fail_auth_times(3);

    client.login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert_eq!(server.auth_calls(), 4);
}

#[tokio::test]
async fn test_login_gives_up_after_three_retries() {
    let store = MemoryCredentialStore::new();
    let (server, client) = setup(store.clone()).await;
    server.fail_auth_times(10);

    let result = client.login(TEST_EMAIL, TEST_PASSWORD).await;

    assert!(matches!(result, Err(ApiError::Status { status: 500 })));
    assert_eq!(server.auth_calls(), 4);
    assert!(store.is_empty());
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_create_account() {
    let (server, client) = setup(MemoryCredentialStore::new()).await;
    server.fail_auth_times(1);

    let message = client
        .create_account("new@example.com", "newbie", "secret")
        .await
        .unwrap();

    assert_eq!(message, "Account created successfully!");
    assert_eq!(server.auth_calls(), 2);
}

#[tokio::test]
async fn test_create_account_rejections() {
    let (_server, client) = setup(MemoryCredentialStore::new()).await;

    let missing = client.create_account("new@example.com", "", "secret").await;
    assert!(matches!(missing, Err(ApiError::Rejected(msg)) if msg == "Missing email, name, or password"));

    let duplicate = client.create_account(TEST_EMAIL, "tester", "secret").await;
    assert!(matches!(duplicate, Err(ApiError::Rejected(_))));
}

// ============================================================================
// Robot Tests
// ============================================================================

#[tokio::test]
async fn test_list_robots() {
    let (_server, client) = setup(MemoryCredentialStore::with_token(TEST_TOKEN)).await;

    let robots = client.robo_chatters().await.unwrap();

    assert_eq!(robots.len(), 2);
    assert_eq!(robots[0].name, "Greeter");
    assert!(robots[0].enabled);
    assert_eq!(robots[1].description.as_deref(), Some("Tells bad jokes"));
}

#[tokio::test]
async fn test_toggle_robot() {
    let (_server, client) = setup(MemoryCredentialStore::with_token(TEST_TOKEN)).await;

    let robot = client.toggle_robo_chatter(2).await.unwrap();
    assert_eq!(robot.id, 2);
    assert!(robot.enabled);
    assert!(robot.description.is_none());

    let robots = client.robo_chatters().await.unwrap();
    assert!(robots.iter().all(|r| r.enabled));
}

#[tokio::test]
async fn test_authenticated_request_retries() {
    let (server, client) = setup(MemoryCredentialStore::with_token(TEST_TOKEN)).await;
    server.fail_robots_times(2);

    client.robo_chatters().await.unwrap();
    assert_eq!(server.robot_calls(), 3);
}

#[tokio::test]
async fn test_authenticated_request_returns_last_error() {
    let (server, client) = setup(MemoryCredentialStore::with_token(TEST_TOKEN)).await;
    server.fail_robots_times(3);

    let result = client.robo_chatters().await;

    assert!(matches!(result, Err(ApiError::Status { status: 503 })));
    assert_eq!(server.robot_calls(), 3);
}

#[tokio::test]
async fn test_wrong_token_is_retried_then_reported() {
    let (server, client) = setup(MemoryCredentialStore::with_token("stale")).await;

    let result = client.toggle_robo_chatter(1).await;

    assert_eq!(result.unwrap_err().status_code(), Some(401));
    assert_eq!(server.robot_calls(), 3);
}
