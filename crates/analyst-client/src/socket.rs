//! Realtime channel to the backend.
//!
//! One [`SocketManager`] owns one WebSocket for one chat session. Frames are
//! dispatched by their `type` field to handlers registered with
//! [`SocketManager::on`] and are also forwarded, together with lifecycle
//! events, on a channel obtained from [`SocketManager::take_events`].
//!
//! Unsolicited closes and failed connects are retried with exponential
//! backoff; see [`ReconnectPolicy`]. [`SocketManager::disconnect`] never
//! triggers a retry.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, Interval};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use analyst_types::{ClientMessage, ServerMessage};

use crate::{ClientError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Callback invoked with the decoded JSON of each frame.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handler key that receives every event.
pub const WILDCARD_EVENT: &str = "*";

/// Lifecycle event names dispatched to handlers alongside server frames.
pub const OPEN_EVENT: &str = "open";
pub const CLOSE_EVENT: &str = "close";
pub const RECONNECT_FAILED_EVENT: &str = "reconnect_failed";

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events forwarded to the owner of the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// The socket opened (initially or after a reconnect).
    Open,
    /// A server frame, keyed by its `type`.
    Message { name: String, payload: Value },
    /// The socket closed without being asked to.
    Closed,
    /// A reconnect attempt is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// All reconnect attempts failed; the manager gave up.
    ReconnectFailed,
}

/// Socket configuration.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub connect_timeout: Duration,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay: Duration,
    /// Interval between `ping` frames; `None` disables the heartbeat.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_reconnect_attempts: 5,
            base_reconnect_delay: Duration::from_secs(1),
            heartbeat_interval: Some(Duration::from_secs(30)),
        }
    }
}

/// Bounded exponential backoff.
///
/// Attempt `k` (1-based) waits `base_delay * 2^(k-1)`. Once `max_attempts`
/// delays have been handed out, [`ReconnectPolicy::next_delay`] returns `None`
/// until [`ReconnectPolicy::reset`] is called.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    base_delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            attempts: 0,
        }
    }

    /// Delay before the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Claim the next attempt, returning its delay.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay_for(self.attempts))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[derive(Clone)]
struct Shared {
    url: Url,
    config: SocketConfig,
    state: Arc<RwLock<ConnectionState>>,
    writer: Arc<Mutex<Option<WsWriter>>>,
    handlers: Arc<RwLock<HashMap<String, Vec<EventHandler>>>>,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    closing: Arc<AtomicBool>,
}

impl Shared {
    fn emit(&self, event: SocketEvent) {
        // The owner may have dropped the receiver; handlers still run.
        let _ = self.events_tx.send(event);
    }

    async fn dispatch(&self, name: &str, payload: &Value) {
        let handlers: Vec<EventHandler> = {
            let registry = self.handlers.read().await;
            registry
                .get(name)
                .into_iter()
                .chain(registry.get(WILDCARD_EVENT))
                .flatten()
                .cloned()
                .collect()
        };
        for handler in handlers {
            handler(payload);
        }
    }

    async fn handle_text(&self, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(error) => {
                warn!(url = %self.url, %error, "dropping undecodable frame");
                return;
            }
        };
        let name = ServerMessage::event_name(&value).to_string();
        debug!(url = %self.url, event = %name, "received frame");
        self.dispatch(&name, &value).await;
        self.emit(SocketEvent::Message {
            name,
            payload: value,
        });
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let mut writer_guard = self.writer.lock().await;
        let writer = writer_guard.as_mut().ok_or(ClientError::NotConnected)?;
        writer
            .send(Message::Text(text.into()))
            .await
            .map_err(|error| ClientError::WebSocket(error.to_string()))
    }

    async fn read_loop(&self, mut reader: WsReader) {
        let mut heartbeat = self
            .config
            .heartbeat_interval
            .map(|period| interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                frame = reader.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!(url = %self.url, %error, "websocket read error");
                        break;
                    }
                },
                _ = next_tick(&mut heartbeat) => {
                    let ping = match ClientMessage::Ping.to_text() {
                        Ok(ping) => ping,
                        Err(error) => {
                            warn!(%error, "failed to encode heartbeat");
                            continue;
                        }
                    };
                    if let Err(error) = self.send_text(ping).await {
                        warn!(url = %self.url, %error, "heartbeat failed");
                        break;
                    }
                }
            }
        }
    }

    async fn supervise(self) {
        let mut policy = ReconnectPolicy::new(
            self.config.max_reconnect_attempts,
            self.config.base_reconnect_delay,
        );

        loop {
            *self.state.write().await = ConnectionState::Connecting;
            let attempt =
                timeout(self.config.connect_timeout, connect_async(self.url.as_str())).await;

            match attempt {
                Ok(Ok((stream, _response))) => {
                    policy.reset();
                    let (writer, reader) = stream.split();
                    *self.writer.lock().await = Some(writer);
                    *self.state.write().await = ConnectionState::Connected;
                    info!(url = %self.url, "websocket connected");
                    self.dispatch(OPEN_EVENT, &json!({})).await;
                    self.emit(SocketEvent::Open);

                    self.read_loop(reader).await;

                    *self.writer.lock().await = None;
                    *self.state.write().await = ConnectionState::Disconnected;
                    if self.closing.load(Ordering::SeqCst) {
                        break;
                    }
                    info!(url = %self.url, "websocket closed");
                    self.dispatch(CLOSE_EVENT, &json!({})).await;
                    self.emit(SocketEvent::Closed);
                }
                Ok(Err(error)) => {
                    *self.state.write().await = ConnectionState::Disconnected;
                    warn!(url = %self.url, %error, "websocket connect failed");
                }
                Err(_) => {
                    *self.state.write().await = ConnectionState::Disconnected;
                    warn!(
                        url = %self.url,
                        timeout = ?self.config.connect_timeout,
                        "websocket connect timed out"
                    );
                }
            }

            if self.closing.load(Ordering::SeqCst) {
                break;
            }

            match policy.next_delay() {
                Some(delay) => {
                    let attempt = policy.attempts();
                    info!(url = %self.url, attempt, ?delay, "scheduling websocket reconnect");
                    self.emit(SocketEvent::Reconnecting { attempt, delay });
                    tokio::time::sleep(delay).await;
                    if self.closing.load(Ordering::SeqCst) {
                        break;
                    }
                }
                None => {
                    warn!(
                        url = %self.url,
                        attempts = policy.attempts(),
                        "giving up on websocket reconnect"
                    );
                    self.dispatch(RECONNECT_FAILED_EVENT, &json!({})).await;
                    self.emit(SocketEvent::ReconnectFailed);
                    break;
                }
            }
        }

        *self.state.write().await = ConnectionState::Disconnected;
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// WebSocket connection for one chat session.
pub struct SocketManager {
    shared: Shared,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<SocketEvent>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SocketManager {
    /// Create a manager with the default configuration.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_config(url, SocketConfig::default())
    }

    /// Create a manager with a custom configuration.
    pub fn with_config(url: &str, config: SocketConfig) -> Result<Self> {
        let parsed_url = Url::parse(url)?;
        if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
            return Err(ClientError::InvalidUrl(format!(
                "URL must use ws:// or wss:// scheme, got: {}",
                parsed_url.scheme()
            )));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            shared: Shared {
                url: parsed_url,
                config,
                state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
                writer: Arc::new(Mutex::new(None)),
                handlers: Arc::new(RwLock::new(HashMap::new())),
                events_tx,
                closing: Arc::new(AtomicBool::new(false)),
            },
            events_rx: Mutex::new(Some(events_rx)),
            task: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        self.shared.url.as_str()
    }

    pub async fn state(&self) -> ConnectionState {
        *self.shared.state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Take the event receiver. Only the first call returns `Some`.
    pub async fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SocketEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Register a handler for an event name (`"*"` receives every event).
    pub async fn on<F>(&self, event: &str, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared
            .handlers
            .write()
            .await
            .entry(event.to_string())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Remove every handler registered for an event name.
    pub async fn off(&self, event: &str) {
        self.shared.handlers.write().await.remove(event);
    }

    /// Start the connection supervisor.
    ///
    /// Returns immediately; [`SocketEvent::Open`] signals the first successful
    /// connection. Failed attempts are retried per the configured policy.
    pub async fn connect(&self) -> Result<()> {
        let mut task_guard = self.task.lock().await;
        if let Some(task) = task_guard.as_ref() {
            if !task.is_finished() {
                return Err(ClientError::AlreadyConnected);
            }
        }

        self.shared.closing.store(false, Ordering::SeqCst);
        let shared = self.shared.clone();
        *task_guard = Some(tokio::spawn(shared.supervise()));
        Ok(())
    }

    /// Close the socket and stop reconnecting.
    pub async fn disconnect(&self) -> Result<()> {
        self.shared.closing.store(true, Ordering::SeqCst);

        if let Some(mut writer) = self.shared.writer.lock().await.take() {
            if let Err(error) = writer.send(Message::Close(None)).await {
                debug!(url = %self.shared.url, %error, "close frame not delivered");
            }
        }

        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }

        *self.shared.state.write().await = ConnectionState::Disconnected;
        Ok(())
    }

    /// Send a frame; fails with [`ClientError::NotConnected`] unless open.
    pub async fn send(&self, message: &ClientMessage) -> Result<()> {
        if self.state().await != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let text = message.to_text()?;
        self.shared.send_text(text).await
    }
}

impl Drop for SocketManager {
    fn drop(&mut self) {
        self.shared.closing.store(true, Ordering::SeqCst);
        if let Ok(mut task) = self.task.try_lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}
