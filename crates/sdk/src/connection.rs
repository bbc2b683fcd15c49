//! Connection lifecycle: dialing, handshake, session tasks and reconnect.
//!
//! A session is one open socket plus its reader and writer tasks. Sessions
//! are numbered; cleanup triggered by an old session never touches a newer
//! one. `disconnect()` bumps an epoch so attempts started before it discard
//! their result.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, Shared};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use rsbot_protocol::{ClientMessage, GatewayMessage};

use crate::error::SdkError;
use crate::sdk::SdkInner;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type ConnectFuture = Shared<BoxFuture<'static, Result<(), SdkError>>>;

const OUTBOUND_BUFFER: usize = 64;
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Connection state of an SDK instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected and not trying to
    Disconnected,
    /// Explicit connect in progress
    Connecting,
    /// Handshake completed
    Connected,
    /// Connection lost, waiting for or running a reconnect attempt
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        })
    }
}

/// Passed to connection-state listeners on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub state: ConnectionState,
    /// Reconnect attempt number, 0 outside of reconnecting
    pub attempt: u32,
}

/// Exponential reconnect backoff: `min(base * 2^(attempt - 1), max)`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: Option<u32>,
}

impl BackoffPolicy {
    /// Delay before attempt number `attempt` (1-based), or `None` once the
    /// retry budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || self.max_retries.is_some_and(|max| attempt > max) {
            return None;
        }
        let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
        Some(
            self.base_delay
                .checked_mul(factor)
                .unwrap_or(self.max_delay)
                .min(self.max_delay),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectMode {
    Explicit,
    Reconnect,
}

struct Session {
    generation: u64,
    outbound: mpsc::Sender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

pub(crate) struct Status {
    state: ConnectionState,
    attempt: u32,
    generation: u64,
    epoch: u64,
    intentional: bool,
    next_attempt_id: u64,
    session: Option<Session>,
    connecting: Option<(u64, ConnectFuture)>,
    reconnect_task: Option<JoinHandle<()>>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt: 0,
            generation: 0,
            epoch: 0,
            intentional: false,
            next_attempt_id: 0,
            session: None,
            connecting: None,
            reconnect_task: None,
        }
    }
}

impl Status {
    /// Record a new state. Repeated reconnecting states still produce an
    /// event since each carries a new attempt number.
    fn transition(&mut self, state: ConnectionState) -> Option<ConnectionEvent> {
        if self.state == state && state != ConnectionState::Reconnecting {
            return None;
        }
        self.state = state;
        Some(ConnectionEvent {
            state,
            attempt: self.attempt,
        })
    }
}

impl SdkInner {
    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: Option<ConnectionEvent>) {
        if let Some(event) = event {
            tracing::debug!(state = %event.state, attempt = event.attempt, "Connection state changed");
            self.connection_listeners.emit(&event);
        }
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        self.status().state
    }

    pub(crate) fn reconnect_attempt(&self) -> u32 {
        self.status().attempt
    }

    /// Connect, or join the attempt already in flight.
    pub(crate) async fn connect(self: &Arc<Self>) -> Result<(), SdkError> {
        let (attempt, event) = {
            let mut status = self.status();
            if status.state == ConnectionState::Connected {
                return Ok(());
            }
            let in_flight = status.connecting.as_ref().map(|(_, attempt)| attempt.clone());
            match in_flight {
                Some(in_flight) => (in_flight, None),
                None => {
                    status.intentional = false;
                    if let Some(task) = status.reconnect_task.take() {
                        task.abort();
                    }
                    status.attempt = 0;
                    let event = status.transition(ConnectionState::Connecting);
                    (self.start_attempt(&mut status, ConnectMode::Explicit), event)
                }
            }
        };
        self.notify(event);
        attempt.await
    }

    /// Spawn a connect attempt and publish it as the in-flight one.
    ///
    /// The attempt runs on its own task so it completes even if every caller
    /// stops waiting.
    fn start_attempt(self: &Arc<Self>, status: &mut Status, mode: ConnectMode) -> ConnectFuture {
        let attempt_id = status.next_attempt_id;
        status.next_attempt_id += 1;
        let epoch = status.epoch;

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = inner.open_session(mode, epoch).await;
            let mut status = inner.status();
            if status.connecting.as_ref().is_some_and(|(id, _)| *id == attempt_id) {
                status.connecting = None;
            }
            outcome
        });

        let shared = async move { task.await.unwrap_or(Err(SdkError::ConnectionFailed)) }
            .boxed()
            .shared();
        status.connecting = Some((attempt_id, shared.clone()));
        shared
    }

    async fn open_session(self: &Arc<Self>, mode: ConnectMode, epoch: u64) -> Result<(), SdkError> {
        let url = self.config.gateway_url();
        tracing::debug!(url = %url, ?mode, "Opening gateway connection");

        let handshake = self.handshake(&url);
        let outcome = match tokio::time::timeout(self.config.connect_timeout, handshake).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SdkError::ConnectTimeout),
        };

        match outcome {
            Ok((write, read)) => self.install_session(write, read, epoch),
            Err(err) => {
                self.attempt_failed(mode, epoch, &err);
                Err(err)
            }
        }
    }

    /// Open the socket, identify, and wait for the gateway's acknowledgement.
    async fn handshake(self: &Arc<Self>, url: &str) -> Result<(WsSink, WsSource), SdkError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let hello = ClientMessage::SdkConnect {
            username: self.config.bot_username.clone(),
            client_id: self.client_id.clone(),
        }
        .to_json()?;
        write
            .send(Message::Text(hello))
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        while let Some(frame) = read.next().await {
            let frame = frame.map_err(|e| SdkError::Transport(e.to_string()))?;
            let Some(message) = decode_frame(frame) else {
                continue;
            };
            match message {
                GatewayMessage::SdkConnected { success: true } => return Ok((write, read)),
                GatewayMessage::SdkConnected { success: false } => {
                    return Err(SdkError::HandshakeRejected)
                }
                other => self.route(other),
            }
        }

        Err(SdkError::Transport("connection closed during handshake".into()))
    }

    fn install_session(
        self: &Arc<Self>,
        write: WsSink,
        read: WsSource,
        epoch: u64,
    ) -> Result<(), SdkError> {
        let event = {
            let mut status = self.status();
            if status.epoch != epoch || status.intentional {
                // Disconnected while the handshake was running.
                return Err(SdkError::ConnectionClosed);
            }

            status.generation += 1;
            let generation = status.generation;
            let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
            let writer = tokio::spawn(write_loop(write, rx));
            let reader = tokio::spawn(Arc::clone(self).read_loop(generation, read));

            status.session = Some(Session {
                generation,
                outbound: tx,
                reader,
                writer,
            });
            status.attempt = 0;
            status.transition(ConnectionState::Connected)
        };

        tracing::info!(url = %self.config.gateway_url(), "Connected to gateway");
        self.notify(event);
        Ok(())
    }

    fn attempt_failed(self: &Arc<Self>, mode: ConnectMode, epoch: u64, err: &SdkError) {
        tracing::warn!(error = %err, ?mode, "Gateway connection attempt failed");
        match mode {
            ConnectMode::Explicit => {
                let event = {
                    let mut status = self.status();
                    if status.epoch != epoch {
                        return;
                    }
                    status.transition(ConnectionState::Disconnected)
                };
                self.notify(event);
            }
            ConnectMode::Reconnect => {
                let current = self.status().epoch == epoch;
                if current {
                    self.schedule_reconnect();
                }
            }
        }
    }

    async fn read_loop(self: Arc<Self>, generation: u64, mut read: WsSource) {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Close(_)) => {
                    tracing::info!("Gateway closed connection");
                    break;
                }
                Ok(frame) => {
                    if let Some(message) = decode_frame(frame) {
                        self.route(message);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "WebSocket error");
                    break;
                }
            }
        }
        self.session_closed(generation);
    }

    /// Clean up after a session's socket ends on its own.
    fn session_closed(self: &Arc<Self>, generation: u64) {
        let session = {
            let mut status = self.status();
            if !status
                .session
                .as_ref()
                .is_some_and(|s| s.generation == generation)
            {
                return;
            }
            status.session.take()
        };
        if let Some(session) = session {
            session.writer.abort();
        }

        self.fail_pending();

        if self.config.auto_reconnect {
            self.schedule_reconnect();
        } else {
            let event = self.status().transition(ConnectionState::Disconnected);
            self.notify(event);
        }
    }

    /// Arm the next reconnect attempt, or give up once the budget is spent.
    fn schedule_reconnect(self: &Arc<Self>) {
        let event = {
            let mut status = self.status();
            if status.intentional {
                return;
            }
            status.attempt += 1;
            let attempt = status.attempt;

            match self.backoff.delay_for(attempt) {
                Some(delay) => {
                    tracing::info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling reconnect"
                    );
                    let epoch = status.epoch;
                    let task = tokio::spawn(Arc::clone(self).reconnect_after(delay, epoch));
                    status.reconnect_task = Some(task);
                    status.transition(ConnectionState::Reconnecting)
                }
                None => {
                    status.attempt = attempt - 1;
                    tracing::error!(
                        attempts = status.attempt,
                        "Max reconnection attempts reached, giving up"
                    );
                    status.transition(ConnectionState::Disconnected)
                }
            }
        };
        self.notify(event);
    }

    async fn reconnect_after(self: Arc<Self>, delay: Duration, epoch: u64) {
        tokio::time::sleep(delay).await;

        let attempt = {
            let mut status = self.status();
            if status.epoch != epoch || status.intentional || status.state == ConnectionState::Connected
            {
                return;
            }
            let in_flight = status.connecting.as_ref().map(|(_, attempt)| attempt.clone());
            match in_flight {
                Some(in_flight) => in_flight,
                None => self.start_attempt(&mut status, ConnectMode::Reconnect),
            }
        };
        let _ = attempt.await;
    }

    /// Close the connection on purpose and fail everything outstanding.
    pub(crate) async fn disconnect(&self) {
        let (session, event) = {
            let mut status = self.status();
            status.intentional = true;
            status.epoch += 1;
            status.connecting = None;
            if let Some(task) = status.reconnect_task.take() {
                task.abort();
            }
            status.attempt = 0;
            let session = status.session.take();
            (session, status.transition(ConnectionState::Disconnected))
        };

        if let Some(session) = session {
            let _ = session.outbound.send(Message::Close(None)).await;
            drop(session.outbound);
            session.reader.abort();
            let mut writer = session.writer;
            if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
                writer.abort();
            }
        }

        self.fail_pending();
        self.notify(event);
    }

    fn fail_pending(&self) {
        self.actions.fail_all(&SdkError::ConnectionClosed);
        self.screenshots.fail_all(&SdkError::ConnectionClosed);
    }

    /// Queue a frame on the current session.
    pub(crate) async fn send_frame(&self, message: &ClientMessage) -> Result<(), SdkError> {
        let json = message.to_json()?;
        // Clone the sender so the status lock is not held across the await.
        let outbound = {
            let status = self.status();
            match &status.session {
                Some(session) => session.outbound.clone(),
                None => {
                    return Err(SdkError::NotConnected {
                        state: status.state,
                    })
                }
            }
        };
        outbound
            .send(Message::Text(json))
            .await
            .map_err(|_| SdkError::ConnectionClosed)
    }

    /// Resolve once connected; fail if the connection settles on
    /// `Disconnected` or `timeout` passes first.
    pub(crate) async fn wait_for_connection(&self, timeout: Duration) -> Result<(), SdkError> {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let subscription = self.connection_listeners.subscribe(move |event: &ConnectionEvent| {
            let outcome = match event.state {
                ConnectionState::Connected => Ok(()),
                ConnectionState::Disconnected => Err(SdkError::ConnectionFailed),
                _ => return,
            };
            if let Some(tx) = tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
                let _ = tx.send(outcome);
            }
        });
        let _guard = subscription.into_guard();

        // Checked after subscribing so a transition in between is not missed.
        if self.connection_state() == ConnectionState::Connected {
            return Ok(());
        }
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(SdkError::ConnectionFailed),
            Err(_) => Err(SdkError::WaitTimeout("connection")),
        }
    }
}

async fn write_loop(mut write: WsSink, mut rx: mpsc::Receiver<Message>) {
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = write.send(message).await {
            tracing::warn!(error = %e, "Failed to send message");
            break;
        }
        if closing {
            break;
        }
    }
}

fn decode_frame(frame: Message) -> Option<GatewayMessage> {
    let text = match frame {
        Message::Text(text) => text,
        Message::Binary(bytes) => String::from_utf8(bytes).ok()?,
        _ => return None,
    };
    match GatewayMessage::from_json(&text) {
        Ok(GatewayMessage::Unknown) => {
            tracing::debug!("Ignoring unknown gateway message type");
            None
        }
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse gateway message");
            None
        }
    }
}
