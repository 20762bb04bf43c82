//! Transport seam between the connection manager and the socket.
//!
//! A [`Transport`] is a pair of channels: text frames out, [`TransportEvent`]s
//! in. Dropping it closes the underlying connection. [`WsConnector`] backs it
//! with a real WebSocket; [`MemoryConnector`] backs it with in-process
//! channels so a caller can play the server side.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::NetError;

/// Something that happened on an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Frame(String),
    /// Remote close or I/O failure; no more events follow
    Closed,
}

/// An open, bidirectional text transport.
#[derive(Debug)]
pub struct Transport {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Transport {
    pub fn new(
        outgoing: mpsc::UnboundedSender<String>,
        incoming: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self { outgoing, incoming }
    }

    /// In-memory transport plus the peer end that drives it.
    pub fn pair() -> (Transport, TransportPeer) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        (
            Transport::new(out_tx, in_rx),
            TransportPeer {
                received: out_rx,
                events: in_tx,
            },
        )
    }

    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<String>,
        mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        (self.outgoing, self.incoming)
    }
}

/// Server side of an in-memory [`Transport`].
#[derive(Debug)]
pub struct TransportPeer {
    received: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportPeer {
    /// Deliver a text frame to the client. Returns false once the client
    /// side has been dropped.
    pub fn send_frame(&self, text: impl Into<String>) -> bool {
        self.events.send(TransportEvent::Frame(text.into())).is_ok()
    }

    /// Simulate a remote close.
    pub fn close(&self) -> bool {
        self.events.send(TransportEvent::Closed).is_ok()
    }

    /// Next frame written by the client; `None` once the client closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.received.recv().await
    }

    /// Next frame written by the client, without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.received.try_recv().ok()
    }

    /// True once the client dropped its end of the transport.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &Url) -> Result<Transport, NetError>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Transport, NetError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut ws_writer, mut ws_reader) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        // Writer task: runs until the owner drops the transport
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if ws_writer.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_writer.close().await;
        });

        // Reader task: forwards frames until the socket ends
        tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text.as_str().to_owned(),
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => continue,
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => continue,
                };
                if in_tx.send(TransportEvent::Frame(text)).is_err() {
                    return;
                }
            }
            let _ = in_tx.send(TransportEvent::Closed);
        });

        Ok(Transport::new(out_tx, in_rx))
    }
}

/// A connection attempt observed by [`MemoryConnector`].
#[derive(Debug)]
pub struct Accepted {
    pub url: Url,
    pub peer: TransportPeer,
}

/// In-process connector. Every successful `connect` hands the peer end to
/// the receiver returned by [`MemoryConnector::new`].
#[derive(Debug)]
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<Accepted>,
    refuse: parking_lot::Mutex<u32>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Accepted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                accepted: tx,
                refuse: parking_lot::Mutex::new(0),
            },
            rx,
        )
    }

    /// Fail the next `count` connection attempts.
    pub fn refuse_next(&self, count: u32) {
        *self.refuse.lock() = count;
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &Url) -> Result<Transport, NetError> {
        {
            let mut refuse = self.refuse.lock();
            if *refuse > 0 {
                *refuse -= 1;
                return Err(NetError::ConnectionClosed);
            }
        }
        let (transport, peer) = Transport::pair();
        self.accepted
            .send(Accepted {
                url: url.clone(),
                peer,
            })
            .map_err(|_| NetError::ConnectionClosed)?;
        Ok(transport)
    }
}
