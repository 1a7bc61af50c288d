//! WebSocket transport
//!
//! Opens the socket on a background task. The token travels as a `token`
//! query parameter. Outgoing frames go through an unbounded queue so `emit`
//! never blocks the session; inbound frames and connection changes are pushed
//! into the session's event channel.

use super::{AckId, Envelope, EventSender, Transport, TransportError, TransportEvent, TransportFactory};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Opens WebSocket transports against a fixed endpoint
#[derive(Debug, Clone)]
pub struct WsTransportFactory {
    url: String,
}

impl WsTransportFactory {
    /// Create a factory for the given `ws://` or `wss://` endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Endpoint URL with the credential attached, percent-encoded
    #[must_use]
    pub fn url_with_token(&self, token: &str) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}token={}", self.url, urlencoding::encode(token))
    }
}

impl TransportFactory for WsTransportFactory {
    type Transport = WsTransport;

    fn connect(&mut self, credential: &str, events: EventSender) -> Result<WsTransport, TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let url = self.url_with_token(credential);
        let connected = Arc::new(AtomicBool::new(false));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        tracing::debug!(endpoint = %self.url, "Opening WebSocket");

        let task = runtime.spawn(run_socket(url, connected.clone(), outbound_rx, events));

        Ok(WsTransport {
            connected,
            outbound: Some(outbound_tx),
            task,
        })
    }
}

/// A WebSocket link to the chat server
#[derive(Debug)]
pub struct WsTransport {
    connected: Arc<AtomicBool>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    task: JoinHandle<()>,
}

impl Transport for WsTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&mut self, event: &str, data: Value, ack: Option<AckId>) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        let frame = Envelope::event(event, data, ack).to_json()?;
        outbound
            .send(Message::Text(frame))
            .map_err(|_| TransportError::Closed)
    }

    fn disconnect(&mut self) {
        let was_connected = self.connected.swap(false, Ordering::SeqCst);

        // Dropping the queue makes a running socket task send a close frame.
        // A task still in the handshake is not watching the queue yet.
        if self.outbound.take().is_some() && was_connected {
            tracing::debug!("Closing WebSocket");
        }
        if !was_connected {
            self.task.abort();
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Socket task: handshake, then pump frames both ways until either side closes
async fn run_socket(
    url: String,
    connected: Arc<AtomicBool>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: EventSender,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket handshake failed");
            let _ = events.send(TransportEvent::ConnectFailed {
                error: e.to_string(),
            });
            return;
        }
    };

    connected.store(true, Ordering::SeqCst);
    if events.send(TransportEvent::Connected).is_err() {
        // Session is gone
        return;
    }

    let (mut sink, mut source) = stream.split();

    let reason = loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match Envelope::from_json(&text) {
                    Ok(envelope) => {
                        if let Some(event) = envelope.into_transport_event() {
                            if events.send(event).is_err() {
                                break "session dropped".to_string();
                            }
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Discarding malformed frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break frame.map_or_else(
                        || "closed by server".to_string(),
                        |f| f.reason.to_string(),
                    );
                }
                // Ping/pong are answered by tungstenite; binary frames are not used
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_string(),
            },
            message = outbound.recv() => match message {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        break e.to_string();
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break "client disconnect".to_string();
                }
            },
        }
    };

    connected.store(false, Ordering::SeqCst);
    tracing::debug!(reason = %reason, "WebSocket closed");
    let _ = events.send(TransportEvent::Disconnected { reason });
}
