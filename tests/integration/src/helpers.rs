//! Test helpers for integration tests
//!
//! `MockChatServer` binds an ephemeral port and serves the REST endpoints and
//! the WebSocket channel the client expects. Failure injection counters make
//! the retry paths observable.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chat_client::{ChatSession, Envelope, TransportFactory};
use chat_core::{CredentialStore, RoboChatter};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::fixtures::{chat_line, default_robots, new_chatter, REFRESHED_TOKEN, TEST_EMAIL, TEST_PASSWORD, TEST_TOKEN, TEST_USER};

/// How long helpers wait for something to happen
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a tracing subscriber once for the test binary
pub fn init_test_tracing() {
    let _ = chat_common::try_init_tracing();
}

/// Shared state of the mock server
pub struct MockState {
    robots: Mutex<Vec<RoboChatter>>,
    auth_failures: AtomicU32,
    robot_failures: AtomicU32,
    auth_calls: AtomicU32,
    robot_calls: AtomicU32,
    frames: Mutex<Vec<Envelope>>,
    push: broadcast::Sender<String>,
}

impl MockState {
    fn new() -> Self {
        let (push, _) = broadcast::channel(64);
        Self {
            robots: Mutex::new(default_robots()),
            auth_failures: AtomicU32::new(0),
            robot_failures: AtomicU32::new(0),
            auth_calls: AtomicU32::new(0),
            robot_calls: AtomicU32::new(0),
            frames: Mutex::new(Vec::new()),
            push,
        }
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Record a client frame and build the replies
    fn handle_frame(&self, frame: Envelope) -> Vec<Envelope> {
        self.frames.lock().push(frame.clone());

        let mut replies = Vec::new();
        if frame.event.as_deref() == Some("send_message") {
            let token = frame.data["token"].as_str().unwrap_or_default();
            let text = frame.data["message"].as_str().unwrap_or_default();

            if token == TEST_TOKEN || token == REFRESHED_TOKEN {
                if let Some(id) = frame.ack {
                    replies.push(Envelope::ack(id, json!({"status": "ok"})));
                }
                replies.push(Envelope::event("broadcast_message", chat_line(TEST_USER, text, 1), None));
            } else if let Some(id) = frame.ack {
                replies.push(Envelope::ack(id, json!({"error": "Invalid token"})));
            }
        }
        replies
    }
}

/// In-process chat server
pub struct MockChatServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    _handle: JoinHandle<()>,
}

impl MockChatServer {
    /// Start a server on an ephemeral port
    pub async fn start() -> Result<Self> {
        init_test_tracing();

        let state = Arc::new(MockState::new());
        let app = router(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get base URL for the REST endpoints
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get URL of the WebSocket endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Answer the next `n` login/registration requests with 500
    pub fn fail_auth_times(&self, n: u32) {
        self.state.auth_failures.store(n, Ordering::SeqCst);
    }

    /// Answer the next `n` robot requests with 503
    pub fn fail_robots_times(&self, n: u32) {
        self.state.robot_failures.store(n, Ordering::SeqCst);
    }

    /// Login and registration requests received
    pub fn auth_calls(&self) -> u32 {
        self.state.auth_calls.load(Ordering::SeqCst)
    }

    /// Robot endpoint requests received
    pub fn robot_calls(&self) -> u32 {
        self.state.robot_calls.load(Ordering::SeqCst)
    }

    /// Frames received from clients so far
    pub fn frames(&self) -> Vec<Envelope> {
        self.state.frames.lock().clone()
    }

    /// Send an event to every connected client
    pub fn push_event(&self, name: &str, data: Value) -> Result<()> {
        let frame = Envelope::event(name, data, None).to_json()?;
        if self.state.push.send(frame).is_err() {
            bail!("no connected clients");
        }
        Ok(())
    }

    /// Wait until a client frame for `event` has arrived and return it
    pub async fn wait_for_frame(&self, event: &str) -> Result<Envelope> {
        let found = tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                let frame = self
                    .frames()
                    .into_iter()
                    .find(|f| f.event.as_deref() == Some(event));
                if let Some(frame) = frame {
                    return frame;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await?;
        Ok(found)
    }
}

/// Drive `session` until `done` holds
pub async fn drive_until<F, C, P>(session: &mut ChatSession<F, C>, mut done: P) -> Result<()>
where
    F: TransportFactory,
    C: CredentialStore,
    P: FnMut(&ChatSession<F, C>) -> bool,
{
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while !done(session) {
            if !session.run_once().await {
                bail!("session went idle in state {}", session.state());
            }
        }
        Ok(())
    })
    .await?
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/create_account", post(create_account))
        .route("/robochatters", get(list_robots))
        .route("/robochatter/toggle/:id", post(toggle_robot))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TEST_TOKEN}"))
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.auth_calls.fetch_add(1, Ordering::SeqCst);
    if MockState::take_failure(&state.auth_failures) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "Missing email or password");
    }
    if email != TEST_EMAIL || password != TEST_PASSWORD {
        return error_reply(StatusCode::BAD_REQUEST, "Invalid credentials");
    }

    Json(json!({ "message": "Login successful!", "token": TEST_TOKEN })).into_response()
}

async fn create_account(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.auth_calls.fetch_add(1, Ordering::SeqCst);
    if MockState::take_failure(&state.auth_failures) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }

    let missing = ["email", "name", "password"]
        .iter()
        .any(|field| body[*field].as_str().unwrap_or_default().is_empty());
    if missing {
        return error_reply(StatusCode::BAD_REQUEST, "Missing email, name, or password");
    }
    if body["email"] == TEST_EMAIL {
        return error_reply(StatusCode::BAD_REQUEST, "User with that email already exists");
    }

    (
        StatusCode::CREATED,
        Json(json!({ "message": "Account created successfully!" })),
    )
        .into_response()
}

async fn list_robots(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.robot_calls.fetch_add(1, Ordering::SeqCst);
    if MockState::take_failure(&state.robot_failures) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if !authorized(&headers) {
        return error_reply(StatusCode::UNAUTHORIZED, "Token is missing!");
    }

    Json(state.robots.lock().clone()).into_response()
}

async fn toggle_robot(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state.robot_calls.fetch_add(1, Ordering::SeqCst);
    if MockState::take_failure(&state.robot_failures) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if !authorized(&headers) {
        return error_reply(StatusCode::UNAUTHORIZED, "Token is missing!");
    }

    let mut robots = state.robots.lock();
    match robots.iter_mut().find(|r| r.id == id) {
        Some(robot) => {
            robot.enabled = !robot.enabled;
            Json(json!({ "id": robot.id, "name": robot.name, "enabled": robot.enabled })).into_response()
        }
        None => error_reply(StatusCode::NOT_FOUND, "RoboChatter not found"),
    }
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<MockState>>,
) -> Response {
    if params.get("token").map(String::as_str) != Some(TEST_TOKEN) {
        return error_reply(StatusCode::UNAUTHORIZED, "Invalid token");
    }

    // Subscribe before the handshake completes so nothing pushed after
    // the client sees the connection is lost
    let push = state.push.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, state, push))
}

async fn send_frame(socket: &mut WebSocket, frame: &Envelope) -> Result<()> {
    socket.send(Message::Text(frame.to_json()?)).await?;
    Ok(())
}

async fn handle_socket(mut socket: WebSocket, state: Arc<MockState>, mut push: broadcast::Receiver<String>) {
    let greeting = [
        Envelope::event("connect_success", json!({ "message": "Connected to server" }), None),
        Envelope::event("broadcast_message", new_chatter(TEST_USER, 1), None),
    ];
    for frame in &greeting {
        if send_frame(&mut socket, frame).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = Envelope::from_json(&text) else {
                        continue;
                    };
                    for reply in state.handle_frame(frame) {
                        if send_frame(&mut socket, &reply).await.is_err() {
                            return;
                        }
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
            pushed = push.recv() => match pushed {
                Ok(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return,
            },
        }
    }
}
