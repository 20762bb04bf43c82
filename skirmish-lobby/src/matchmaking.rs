//! Matchmaking HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::LobbyError;
use crate::state::RosterEntry;

/// Body of `POST /api/queue/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub success: bool,
    #[serde(default)]
    pub queue_size: u32,
}

/// Server-side lobby phase as reported by `/api/queue/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyPhase {
    Forming,
    Picking,
    Starting,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    #[serde(default)]
    pub lobby_id: Option<String>,
    pub phase: LobbyPhase,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub players: Vec<RosterEntry>,
}

/// Body of `GET /api/queue/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum QueueStatusReport {
    Idle,
    Searching {
        #[serde(default)]
        players_in_queue: u32,
        #[serde(default)]
        estimated_wait_seconds: Option<u32>,
    },
    Lobby(LobbySnapshot),
    GameStarting {
        game_id: String,
    },
}

/// Queue endpoints the lobby talks to.
#[async_trait]
pub trait MatchmakingApi: Send + Sync + 'static {
    async fn join(&self, mode: &str) -> Result<JoinResponse, LobbyError>;
    async fn leave(&self) -> Result<(), LobbyError>;
    async fn status(&self) -> Result<QueueStatusReport, LobbyError>;
}

/// `reqwest` implementation against the game server's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpMatchmaking {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMatchmaking {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing client (cookies, auth headers, timeouts).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl MatchmakingApi for HttpMatchmaking {
    async fn join(&self, mode: &str) -> Result<JoinResponse, LobbyError> {
        let response = self
            .client
            .post(self.endpoint("/api/queue/join"))
            .json(&json!({ "mode": mode }))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn leave(&self) -> Result<(), LobbyError> {
        self.client
            .post(self.endpoint("/api/queue/leave"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn status(&self) -> Result<QueueStatusReport, LobbyError> {
        let response = self
            .client
            .get(self.endpoint("/api/queue/status"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
