//! Chat session
//!
//! `ChatSession` is the client's one logical connection to the chat server.
//! It is driven from a single task: operations are plain method calls, and
//! `run_once` waits for the next thing that needs handling (an inbound
//! transport event, a typing indicator running out, a scheduled reconnect)
//! and handles exactly that. Nothing inside the session runs concurrently.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chat_common::SessionConfig;
use chat_core::{
    robot_toggle_announcement, AckPayload, BroadcastKind, BroadcastPayload, ChatEvent,
    CredentialStore, InboundEvent, PresenceCache, RetryDecision, RetryPolicy, RetryState,
    SendMessagePayload, TypingEventPayload, TypingOrigin, TypingPayload, TypingState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{ConnectionState, DeliveryError, SessionError};
use crate::handlers::HandlerRegistry;
use crate::transport::{AckId, Transport, TransportEvent, TransportFactory};

/// Called once with the outcome of a sent message
pub type AckHandler = Box<dyn FnOnce(Result<(), DeliveryError>) + Send>;

/// Minimum gap between two outgoing typing notifications
const DEFAULT_TYPING_THROTTLE: Duration = Duration::from_secs(2);

/// Client session with the chat server
pub struct ChatSession<F, C>
where
    F: TransportFactory,
    C: CredentialStore,
{
    factory: F,
    credentials: C,

    /// Current transport, kept after a disconnect until replaced or torn down
    transport: Option<F::Transport>,
    /// Inbound events of the current transport
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    state: ConnectionState,
    token: Option<String>,

    retry: RetryState,
    /// Deadlines of scheduled reconnect attempts, earliest first
    reconnects: VecDeque<Instant>,

    last_sent: Option<String>,
    next_ack_id: AckId,
    pending_acks: HashMap<AckId, Option<AckHandler>>,

    presence: PresenceCache,
    typing: TypingState,
    typing_throttle: Duration,
    last_typing_emit: Option<Instant>,

    handlers: HandlerRegistry,
}

impl<F, C> ChatSession<F, C>
where
    F: TransportFactory,
    C: CredentialStore,
{
    /// Create a disconnected session with default retry and throttle settings
    pub fn new(factory: F, credentials: C) -> Self {
        Self {
            factory,
            credentials,
            transport: None,
            events: None,
            state: ConnectionState::Disconnected,
            token: None,
            retry: RetryPolicy::default().start(),
            reconnects: VecDeque::new(),
            last_sent: None,
            next_ack_id: 1,
            pending_acks: HashMap::new(),
            presence: PresenceCache::new(),
            typing: TypingState::new(),
            typing_throttle: DEFAULT_TYPING_THROTTLE,
            last_typing_emit: None,
            handlers: HandlerRegistry::new(),
        }
    }

    /// Create a disconnected session tuned by configuration
    pub fn with_config(factory: F, credentials: C, config: &SessionConfig) -> Self {
        Self::new(factory, credentials)
            .with_retry_policy(config.retry_policy())
            .with_typing_throttle(config.typing_throttle())
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy.start();
        self
    }

    #[must_use]
    pub fn with_typing_throttle(mut self, throttle: Duration) -> Self {
        self.typing_throttle = throttle;
        self
    }

    // === Handlers ===

    /// Handle every broadcast payload
    pub fn on_message<H>(&mut self, handler: H)
    where
        H: FnMut(&BroadcastPayload) + Send + 'static,
    {
        self.handlers.set_message(handler);
    }

    /// Handle presence roster changes: `(named users, lurker count)`
    pub fn on_presence<H>(&mut self, handler: H)
    where
        H: FnMut(&[String], u32) + Send + 'static,
    {
        self.handlers.set_presence(handler);
    }

    /// Handle requests to re-fetch the robot roster
    pub fn on_agent_list<H>(&mut self, handler: H)
    where
        H: FnMut() + Send + 'static,
    {
        self.handlers.set_agent_list(handler);
    }

    /// Handle typing indicator changes: `(human typing, robot typing)`
    pub fn on_typing<H>(&mut self, handler: H)
    where
        H: FnMut(bool, bool) + Send + 'static,
    {
        self.handlers.set_typing(handler);
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    // === Accessors ===

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the transport is present and usable
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_connected)
    }

    /// Reconnect attempts consumed since the last established connection
    pub fn retry_count(&self) -> u32 {
        self.retry.attempts()
    }

    /// Text of the last message handed to the transport
    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    pub fn presence(&self) -> &PresenceCache {
        &self.presence
    }

    pub fn typing(&self) -> &TypingState {
        &self.typing
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    /// Messages sent but not yet acknowledged
    pub fn pending_acks(&self) -> usize {
        self.pending_acks.len()
    }

    /// Check if nothing can happen without a new operation
    pub fn is_idle(&self) -> bool {
        self.events.is_none() && self.typing.next_deadline().is_none() && self.reconnects.is_empty()
    }

    // === Operations ===

    /// Open a connection with the session token, or the stored login token
    /// if the session has none yet
    ///
    /// Any existing transport is closed first. The retry counter is reset
    /// once the server accepts the connection, not here.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        let token = self
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| self.credentials.auth_token());
        let Some(token) = token else {
            tracing::error!("No auth token found. Cannot connect.");
            return Err(SessionError::MissingToken);
        };

        self.close_transport();

        let (tx, rx) = mpsc::unbounded_channel();
        match self.factory.connect(&token, tx) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.events = Some(rx);
                self.token = Some(token);
                self.state = ConnectionState::Connecting;
                tracing::info!("Connecting to chat server");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to open transport");
                self.state = ConnectionState::Disconnected;
                Err(e.into())
            }
        }
    }

    /// Close the connection and reset session state
    ///
    /// Cancels scheduled reconnects, fails unacknowledged sends, forgets the
    /// session token and clears presence and typing indicators (notifying
    /// handlers if they were set).
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        if self.transport.is_none() {
            tracing::info!("No active connection.");
            return Err(SessionError::NoActiveConnection);
        }

        self.close_transport();
        self.state = ConnectionState::Disconnected;
        self.reconnects.clear();
        self.token = None;

        if !self.presence.is_empty() || self.presence.total() > 0 {
            self.presence.clear();
            self.notify_presence();
        }
        if self.typing.reset() {
            self.notify_typing();
        }

        tracing::info!("Disconnected from chat server");
        Ok(())
    }

    /// Send a chat message
    ///
    /// Fails without side effects unless the transport is connected. The
    /// server's acknowledgment is only logged.
    pub fn send_message(&mut self, text: &str) -> Result<(), SessionError> {
        self.send(text, None)
    }

    /// Send a chat message and report the server's acknowledgment to `handler`
    ///
    /// The handler is not called if the send itself fails.
    pub fn send_message_with_ack<H>(&mut self, text: &str, handler: H) -> Result<(), SessionError>
    where
        H: FnOnce(Result<(), DeliveryError>) + Send + 'static,
    {
        self.send(text, Some(Box::new(handler)))
    }

    /// Re-send the last message with the refreshed token from the credential store
    pub fn retry_send_message(&mut self) -> Result<(), SessionError> {
        tracing::info!("Retrying last message with refreshed token");
        self.token = self.credentials.refreshed_token();

        match (self.last_sent.clone(), self.token.is_some()) {
            (Some(text), true) => self.send_message(&text),
            _ => {
                tracing::error!("No message to retry or token unavailable.");
                Err(SessionError::NothingToRetry)
            }
        }
    }

    /// Schedule a reconnect after the policy's fixed delay
    ///
    /// Once the attempts are spent the session is `Failed`, attempts still
    /// queued are dropped, and further calls do nothing until an explicit
    /// `connect` succeeds.
    pub fn retry_connection(&mut self) -> Result<(), SessionError> {
        match self.retry.next_attempt() {
            RetryDecision::Retry { attempt, delay } => {
                self.reconnects.push_back(Instant::now() + delay);
                tracing::info!(
                    attempt,
                    max_attempts = self.retry.policy().max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                Ok(())
            }
            RetryDecision::Exhausted { attempts } => {
                tracing::error!(attempts, "Max retries reached. Could not reconnect.");
                self.reconnects.clear();
                self.state = ConnectionState::Failed;
                Err(SessionError::RetriesExhausted { attempts })
            }
        }
    }

    /// Tell the server the local user is typing
    pub fn emit_typing_event(&mut self) -> Result<(), SessionError> {
        let Some(transport) = self.transport.as_mut().filter(|t| t.is_connected()) else {
            tracing::debug!("Not connected, typing event dropped");
            return Err(SessionError::NotConnected);
        };

        let payload = serde_json::to_value(TypingEventPayload::user())?;
        transport.emit(ChatEvent::TypingEvent.as_str(), payload, None)?;
        self.last_typing_emit = Some(Instant::now());
        Ok(())
    }

    /// Report local input, emitting a typing event at most once per throttle window
    ///
    /// Returns `true` if a typing event went out.
    pub fn notify_local_input(&mut self) -> bool {
        let now = Instant::now();
        let throttled = self
            .last_typing_emit
            .is_some_and(|last| now.duration_since(last) <= self.typing_throttle);
        if throttled {
            return false;
        }
        self.emit_typing_event().is_ok()
    }

    /// Announce in the chat that a robot was switched on or off
    pub fn announce_robot_toggle(&mut self, enabled: bool) -> Result<(), SessionError> {
        self.send_message(robot_toggle_announcement(enabled))
    }

    // === Driving ===

    /// Wait for the next inbound event, typing expiry or scheduled reconnect
    /// and handle it
    ///
    /// Returns `false` immediately if the session is idle. Cancel-safe: if the
    /// future is dropped before completing, nothing was handled.
    pub async fn run_once(&mut self) -> bool {
        let typing_deadline = self.typing.next_deadline();
        let reconnect_deadline = self.reconnects.front().copied();

        if self.events.is_none() && typing_deadline.is_none() && reconnect_deadline.is_none() {
            return false;
        }

        tokio::select! {
            event = wait_for_event(self.events.as_mut()) => match event {
                Some(event) => self.handle_event(event),
                None => self.on_events_closed(),
            },
            () = wait_until(typing_deadline) => self.expire_typing(),
            () = wait_until(reconnect_deadline) => self.fire_reconnect(),
        }

        true
    }

    /// Handle events until the session is idle
    pub async fn run(&mut self) {
        while self.run_once().await {}
    }

    /// Apply one transport event
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                tracing::info!("Connection established");
                self.state = ConnectionState::Connected;
                self.retry.reset();
                self.reconnects.clear();
            }
            TransportEvent::Disconnected { reason } => {
                tracing::info!(reason = %reason, "Disconnected");
                self.mark_disconnected();
            }
            TransportEvent::ConnectFailed { error } => {
                tracing::error!(error = %error, "Connection error");
                self.mark_disconnected();
            }
            TransportEvent::Event { name, data } => match InboundEvent::decode(&name, data) {
                Ok(event) => self.handle_inbound(event),
                Err(e) if e.is_unknown_event() => {
                    tracing::debug!(event = %name, "Ignoring unknown event");
                }
                Err(e) => {
                    tracing::warn!(event = %name, error = %e, "Discarding malformed event");
                }
            },
            TransportEvent::Ack { id, data } => self.resolve_ack(id, &data),
        }
    }

    // === Internals ===

    fn send(&mut self, text: &str, handler: Option<AckHandler>) -> Result<(), SessionError> {
        let Some(transport) = self.transport.as_mut().filter(|t| t.is_connected()) else {
            tracing::error!("Connection is not open. Cannot send message.");
            return Err(SessionError::NotConnected);
        };

        let token = self.token.clone().unwrap_or_default();
        let payload = serde_json::to_value(SendMessagePayload::new(text, token))?;

        self.last_sent = Some(text.to_string());
        let id = self.next_ack_id;
        self.next_ack_id += 1;

        if let Err(e) = transport.emit(ChatEvent::SendMessage.as_str(), payload, Some(id)) {
            tracing::error!(error = %e, "Failed to emit message");
            return Err(e.into());
        }

        self.pending_acks.insert(id, handler);
        tracing::debug!(ack_id = id, "Message emitted");
        Ok(())
    }

    fn handle_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::ConnectSuccess(payload) => {
                tracing::info!(
                    server_message = payload.message.as_deref().unwrap_or_default(),
                    "Connection accepted by server"
                );
            }
            InboundEvent::ConnectError(payload) => {
                tracing::error!(
                    error = payload.error.as_deref().unwrap_or("unknown"),
                    "Server refused connection"
                );
            }
            InboundEvent::System(payload) => {
                if payload.requests_robot_refresh() {
                    self.handlers.notify_agent_list();
                } else {
                    tracing::debug!(event = ?payload.event, "Ignoring system message");
                }
            }
            InboundEvent::Broadcast(payload) => self.handle_broadcast(&payload),
            InboundEvent::Typing(payload) => self.handle_typing(payload),
        }
    }

    fn handle_broadcast(&mut self, payload: &BroadcastPayload) {
        self.handlers.notify_message(payload);

        if let Some(error) = &payload.error {
            tracing::warn!(error = %error, "Server reported an error");
        }

        let user = payload.user.as_deref();
        let count = payload.count();

        let changed = match payload.kind() {
            BroadcastKind::NewChatter => self.presence.join(user, count),
            BroadcastKind::RemoveChatter => self.presence.leave(user, count),
            BroadcastKind::RefreshRobots => {
                self.handlers.notify_agent_list();
                false
            }
            BroadcastKind::Message => user.is_some_and(|user| self.presence.observe(user, count)),
        };

        if changed {
            tracing::debug!(
                named = self.presence.len(),
                total = self.presence.total(),
                "Presence updated"
            );
            self.notify_presence();
        }
    }

    fn handle_typing(&mut self, payload: TypingPayload) {
        let now = Instant::now();
        let flipped = match payload.origin {
            TypingOrigin::User => self.typing.start_human(now, payload.duration()),
            TypingOrigin::Robot => self.typing.start_agent(now),
        };
        if flipped {
            self.notify_typing();
        }
    }

    fn expire_typing(&mut self) {
        if self.typing.expire(Instant::now()) {
            self.notify_typing();
        }
    }

    fn fire_reconnect(&mut self) {
        self.reconnects.pop_front();

        if self.state.is_connected() {
            tracing::debug!("Already connected, skipping scheduled reconnect");
            return;
        }

        tracing::info!(attempts = self.retry.attempts(), "Reconnecting");
        // Failures are logged inside connect
        let _ = self.connect();
    }

    fn resolve_ack(&mut self, id: AckId, data: &Value) {
        let Some(handler) = self.pending_acks.remove(&id) else {
            tracing::debug!(ack_id = id, "Acknowledgment for unknown message");
            return;
        };

        let result = match AckPayload::from_value(data).error {
            Some(error) => {
                tracing::error!(ack_id = id, error = %error, "Server error on emit");
                Err(DeliveryError::Rejected(error))
            }
            None => {
                tracing::info!(ack_id = id, "Message sent successfully");
                Ok(())
            }
        };

        if let Some(handler) = handler {
            handler(result);
        }
    }

    fn fail_pending_acks(&mut self) {
        if self.pending_acks.is_empty() {
            return;
        }

        tracing::debug!(count = self.pending_acks.len(), "Dropping unacknowledged messages");
        for (_, handler) in self.pending_acks.drain() {
            if let Some(handler) = handler {
                handler(Err(DeliveryError::ConnectionClosed));
            }
        }
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect();
        }
        self.events = None;
        self.fail_pending_acks();
    }

    fn mark_disconnected(&mut self) {
        if !self.state.is_failed() {
            self.state = ConnectionState::Disconnected;
        }
        self.fail_pending_acks();
    }

    fn on_events_closed(&mut self) {
        tracing::debug!("Transport event channel closed");
        self.events = None;
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            self.state = ConnectionState::Disconnected;
        }
        self.fail_pending_acks();
    }

    fn notify_presence(&mut self) {
        self.handlers
            .notify_presence(self.presence.users(), self.presence.lurkers());
    }

    fn notify_typing(&mut self) {
        let (human, agent) = self.typing.flags();
        self.handlers.notify_typing(human, agent);
    }
}

impl<F, C> std::fmt::Debug for ChatSession<F, C>
where
    F: TransportFactory,
    C: CredentialStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &self.state)
            .field("retries", &self.retry.attempts())
            .field("scheduled_reconnects", &self.reconnects.len())
            .field("pending_acks", &self.pending_acks.len())
            .field("presence", &self.presence)
            .field("typing", &self.typing.flags())
            .finish()
    }
}

async fn wait_for_event(
    events: Option<&mut mpsc::UnboundedReceiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
