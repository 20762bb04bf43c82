//! Game socket connection manager.
//!
//! Owns at most one live transport at a time and drives:
//! - Connection lifecycle (connect, disconnect, reconnect with backoff)
//! - Heartbeats and round-trip latency sampling
//! - The single dispatch point for inbound frames (projection, then subscribers)
//!
//! ```text
//!  connect() ──► open ──► Connector ──► Transport
//!                  ▲                       │ frames
//!                  │ backoff               ▼
//!             reconnect ◄── close ◄── read loop ──► router ──► projection
//!                                          │
//!                                          └──► subscribers (registration order)
//! ```
//!
//! Every open bumps a session generation. Tasks spawned for a session (read
//! loop, heartbeat, reconnect timer) carry the generation they belong to and
//! re-check it before touching state, so a replaced session can never act.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::ConnectionConfig;
use crate::error::NetError;
use crate::projection::SharedProjection;
use crate::protocol::{is_lobby, ClientMessage, InboundMessage, ServerMessage};
use crate::router;
use crate::subscribers::{SubscriberRegistry, SubscriberToken};
use crate::transport::{Connector, Transport, TransportEvent, WsConnector};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub reconnecting: bool,
    pub latency_ms: u64,
    pub reconnect_attempts: u32,
    pub game_id: Option<String>,
    pub player_id: Option<String>,
}

struct ActiveSession {
    outgoing: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

#[derive(Default)]
struct SessionState {
    connected: bool,
    reconnecting: bool,
    latency_ms: u64,
    reconnect_attempts: u32,
    game_id: Option<String>,
    player_id: Option<String>,
    generation: u64,
    session: Option<ActiveSession>,
    heartbeat: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
    ping_sent_at: Option<Instant>,
}

impl SessionState {
    fn stop_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
        self.ping_sent_at = None;
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
        self.reconnecting = false;
    }

    /// Detach the reader first, then drop the outgoing half, which closes
    /// the transport. The close is never observed by this manager.
    fn detach_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.reader.abort();
            drop(session.outgoing);
        }
    }

    fn may_reconnect(&self) -> bool {
        matches!(
            (&self.game_id, &self.player_id),
            (Some(game_id), Some(_)) if !is_lobby(game_id)
        )
    }

    fn send(&self, message: &ClientMessage) -> bool {
        let session = match (&self.session, self.connected) {
            (Some(session), true) => session,
            _ => {
                log::debug!("Dropping outbound message: socket not open");
                return false;
            }
        };
        match message.encode() {
            Ok(text) => session.outgoing.send(text).is_ok(),
            Err(e) => {
                log::warn!("Failed to encode outbound message: {e}");
                false
            }
        }
    }

    fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.connected,
            reconnecting: self.reconnecting,
            latency_ms: self.latency_ms,
            reconnect_attempts: self.reconnect_attempts,
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
        }
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        self.stop_heartbeat();
        self.cancel_reconnect();
        self.detach_session();
    }
}

struct Shared {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    projection: SharedProjection,
    subscribers: SubscriberRegistry,
    state: Mutex<SessionState>,
}

/// Client side of the game socket.
///
/// Cheap to clone; clones share the same session. Must be used from within
/// a Tokio runtime.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        projection: SharedProjection,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                connector,
                projection,
                subscribers: SubscriberRegistry::new(),
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Manager that talks WebSocket to `config.origin`.
    pub fn websocket(config: ConnectionConfig, projection: SharedProjection) -> Self {
        Self::new(config, Arc::new(WsConnector), projection)
    }

    /// Record the identifiers and open a session.
    ///
    /// For the lobby channel (`game_id == "lobby"`) the projection's game id
    /// is left alone; the player id is always recorded. If the open fails the
    /// error is returned and a reconnect is scheduled when policy allows.
    pub async fn connect(
        &self,
        game_id: impl Into<String>,
        player_id: impl Into<String>,
    ) -> Result<(), NetError> {
        let game_id = game_id.into();
        let player_id = player_id.into();

        {
            let mut projection = self.shared.projection.lock();
            if !is_lobby(&game_id) {
                projection.set_game_id(&game_id);
            }
            projection.set_player_id(&player_id);
        }

        {
            let mut state = self.shared.state.lock();
            state.cancel_reconnect();
            state.game_id = Some(game_id);
            state.player_id = Some(player_id);
            state.reconnect_attempts = 0;
        }

        open(self.shared.clone()).await
    }

    /// Tear the session down without triggering a reconnect.
    pub fn disconnect(&self) {
        let mut state = self.shared.state.lock();
        state.stop_heartbeat();
        state.cancel_reconnect();
        state.detach_session();
        state.connected = false;
        state.game_id = None;
        state.player_id = None;
        state.generation += 1;
        log::info!("Game socket disconnected");
    }

    /// Send a message if the socket is open. Messages sent while closed are
    /// dropped, not queued. Returns whether the message was handed to the
    /// transport.
    pub fn send(&self, message: &ClientMessage) -> bool {
        self.shared.state.lock().send(message)
    }

    /// Register an inbound-message callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberToken
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    /// Remove a callback. Returns false if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriberToken) -> bool {
        self.shared.subscribers.unsubscribe(token)
    }

    /// The registry inbound frames are dispatched to.
    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.shared.subscribers
    }

    /// The game-state projection inbound frames are routed to.
    pub fn projection(&self) -> &SharedProjection {
        &self.shared.projection
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Snapshot of the current session.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.state.lock().status()
    }

    /// Check whether a session is open.
    pub fn is_connected(&self) -> bool {
        self.shared.state.lock().connected
    }

    /// Last measured heartbeat round trip, 0 until the first sample.
    pub fn latency_ms(&self) -> u64 {
        self.shared.state.lock().latency_ms
    }
}

/// Replace the current session with a fresh transport.
///
/// Boxed so the reconnect task, which calls back into `open`, has a nameable
/// future type.
fn open(shared: Arc<Shared>) -> BoxFuture<'static, Result<(), NetError>> {
    async move {
        let (generation, url) = {
            let mut state = shared.state.lock();
            state.stop_heartbeat();
            state.detach_session();
            state.connected = false;
            state.generation += 1;
            let (Some(game_id), Some(player_id)) = (&state.game_id, &state.player_id) else {
                return Err(NetError::ConnectionClosed);
            };
            let url = shared.config.socket_url(player_id, game_id)?;
            (state.generation, url)
        };

        log::info!("Opening game socket {url}");
        match shared.connector.connect(&url).await {
            Ok(transport) => install(&shared, generation, transport),
            Err(e) => {
                log::warn!("Failed to open game socket: {e}");
                handle_close(&shared, generation);
                Err(e)
            }
        }
    }
    .boxed()
}

fn install(shared: &Arc<Shared>, generation: u64, transport: Transport) -> Result<(), NetError> {
    let mut state = shared.state.lock();
    if state.generation != generation {
        log::debug!("Discarding superseded socket (generation {generation})");
        return Err(NetError::Superseded);
    }

    let (outgoing, incoming) = transport.into_parts();
    let reader = tokio::spawn(read_loop(Arc::downgrade(shared), generation, incoming));
    state.session = Some(ActiveSession { outgoing, reader });
    state.connected = true;
    state.reconnecting = false;
    state.reconnect_attempts = 0;
    state.heartbeat = Some(spawn_heartbeat(
        Arc::downgrade(shared),
        generation,
        shared.config.heartbeat_interval,
    ));

    if let Some(game_id) = state.game_id.clone().filter(|id| !is_lobby(id)) {
        state.send(&ClientMessage::join_game(game_id));
    }

    log::info!("Game socket open (generation {generation})");
    Ok(())
}

async fn read_loop(
    shared: Weak<Shared>,
    generation: u64,
    mut incoming: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = incoming.recv().await {
        let Some(strong) = shared.upgrade() else {
            return;
        };
        match event {
            TransportEvent::Frame(text) => handle_frame(&strong, generation, &text),
            TransportEvent::Closed => break,
        }
    }
    if let Some(strong) = shared.upgrade() {
        handle_close(&strong, generation);
    }
}

/// The single dispatch point for inbound frames.
fn handle_frame(shared: &Shared, generation: u64, text: &str) {
    let inbound = match InboundMessage::parse(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            log::debug!("Dropping unparseable frame: {e}");
            return;
        }
    };

    {
        let mut state = shared.state.lock();
        if state.generation != generation {
            return;
        }
        if matches!(inbound.message, ServerMessage::Announcement { .. }) {
            if let Some(sent) = state.ping_sent_at.take() {
                state.latency_ms = u64::try_from(sent.elapsed().as_millis()).unwrap_or(u64::MAX);
            }
        }
    }

    router::route(&inbound.message, &mut *shared.projection.lock());
    shared.subscribers.dispatch(&inbound);
}

fn handle_close(shared: &Arc<Shared>, generation: u64) {
    let mut state = shared.state.lock();
    if state.generation != generation {
        return;
    }
    state.connected = false;
    state.stop_heartbeat();
    // Runs on the reader task itself, so the handle is dropped, not aborted.
    state.session = None;
    log::info!("Game socket closed (generation {generation})");

    if state.may_reconnect() {
        schedule_reconnect(shared, &mut state);
    }
}

fn schedule_reconnect(shared: &Arc<Shared>, state: &mut SessionState) {
    let delay = shared.config.backoff.delay(state.reconnect_attempts);
    state.reconnect_attempts = state.reconnect_attempts.saturating_add(1);
    state.reconnecting = true;
    log::info!(
        "Reconnecting in {}ms (attempt {})",
        delay.as_millis(),
        state.reconnect_attempts
    );

    let weak = Arc::downgrade(shared);
    let generation = state.generation;
    let deadline = Instant::now() + delay;
    let timer = tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        {
            let mut state = shared.state.lock();
            if !state.reconnecting || state.generation != generation {
                return;
            }
            state.reconnect_timer = None;
        }
        // A failed attempt schedules the next one through handle_close.
        let _ = open(shared).await;
    });

    if let Some(previous) = state.reconnect_timer.replace(timer) {
        previous.abort();
    }
}

/// The first heartbeat is due one `period` after this call, not after the
/// task first runs.
fn spawn_heartbeat(shared: Weak<Shared>, generation: u64, period: Duration) -> JoinHandle<()> {
    let start = Instant::now() + period;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(start, period);
        loop {
            ticker.tick().await;
            let Some(strong) = shared.upgrade() else {
                return;
            };
            if !send_heartbeat(&strong, generation) {
                return;
            }
        }
    })
}

/// Record the ping time and send a heartbeat. False once the session is gone.
fn send_heartbeat(shared: &Shared, generation: u64) -> bool {
    let mut state = shared.state.lock();
    if state.generation != generation || !state.connected {
        return false;
    }
    state.ping_sent_at = Some(Instant::now());
    state.send(&ClientMessage::heartbeat());
    true
}
