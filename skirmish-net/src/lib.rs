//! # skirmish-net: game socket layer for the Skirmish client
//!
//! Owns the persistent connection to the game server and routes everything
//! that arrives on it.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────┐    JSON frames     ┌─────────────┐
//! │ ConnectionManager │ ◄────────────────► │ Game server │
//! │ (one session)     │   ws:// / wss://   └─────────────┘
//! └─────────┬─────────┘
//!           │ every inbound frame
//!           ▼
//! ┌───────────────────┐        ┌────────────────────┐
//! │ router::route     │ ─────► │ GameProjection     │
//! └─────────┬─────────┘        │ (external state)   │
//!           ▼                  └────────────────────┘
//! ┌───────────────────┐
//! │ SubscriberRegistry│  registration order
//! └───────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`backoff`]: reconnect delay schedule
//! - [`protocol`]: inbound/outbound message types
//! - [`transport`]: connector seam (WebSocket and in-memory)
//! - [`connection`]: session lifecycle, heartbeat, reconnect
//! - [`router`]: projection routing
//! - [`subscribers`]: ordered callback registry
//! - [`projection`]: game-state projection trait

pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod projection;
pub mod protocol;
pub mod router;
pub mod subscribers;
pub mod transport;

pub use backoff::{reconnect_delay_ms, BackoffPolicy};
pub use config::ConnectionConfig;
pub use connection::{ConnectionManager, ConnectionStatus};
pub use error::NetError;
pub use projection::{GameProjection, GameView, SharedProjection};
pub use protocol::{
    ClientMessage, ControlMessage, InboundMessage, ServerMessage, TickSnapshot, LOBBY_GAME_ID,
};
pub use subscribers::{SubscriberRegistry, SubscriberToken};
pub use transport::{Connector, MemoryConnector, Transport, TransportEvent, TransportPeer, WsConnector};
