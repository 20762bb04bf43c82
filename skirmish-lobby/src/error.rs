use thiserror::Error;

use crate::state::QueueStatus;

/// Errors surfaced by the lobby and the matchmaking client.
#[derive(Error, Debug)]
pub enum LobbyError {
    #[error("Matchmaking request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected queue join for mode '{mode}'")]
    JoinRejected { mode: String },

    #[error("Queue join for mode '{mode}' abandoned by a lobby reset")]
    JoinAbandoned { mode: String },

    #[error("Cannot move lobby from {from} to {to}")]
    InvalidTransition { from: QueueStatus, to: QueueStatus },
}
