use thiserror::Error;

/// Errors surfaced by the connection layer.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection superseded by a newer session")]
    Superseded,

    #[error("Connection closed")]
    ConnectionClosed,
}
