//! Connection configuration.

use std::time::Duration;

use url::Url;

use crate::backoff::BackoffPolicy;
use crate::error::NetError;

/// Configuration for a [`ConnectionManager`](crate::connection::ConnectionManager).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Origin of the page/app that hosts the client, e.g. `https://play.example.com`.
    /// The socket scheme follows it: `https` → `wss`, `http` → `ws`.
    pub origin: String,
    /// Path of the socket endpoint
    pub socket_path: String,
    /// Interval between heartbeats
    pub heartbeat_interval: Duration,
    /// Reconnect delay schedule
    pub backoff: BackoffPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:3000".to_string(),
            socket_path: "/ws".to_string(),
            heartbeat_interval: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration for `origin` with default timings.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Set the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the reconnect backoff.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the socket endpoint path.
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Build the socket URL for a player/game pair.
    pub fn socket_url(&self, player_id: &str, game_id: &str) -> Result<Url, NetError> {
        let invalid = |reason: &str| NetError::InvalidOrigin {
            origin: self.origin.clone(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(&self.origin).map_err(|e| invalid(&e.to_string()))?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            _ => return Err(invalid("unsupported scheme")),
        };
        url.set_scheme(scheme)
            .map_err(|()| invalid("cannot switch to a socket scheme"))?;
        url.set_path(&self.socket_path);
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair("playerId", player_id)
            .append_pair("gameId", game_id);
        Ok(url)
    }
}
