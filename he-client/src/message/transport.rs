use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::fmt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{ClientError, ClientResult};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport abstraction for the notification channel
///
/// Frames are JSON text. `read_frame` returns `Ok(None)` once the peer has
/// closed the connection.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn read_frame(&self) -> ClientResult<Option<String>>;
    async fn write_frame(&self, frame: String) -> ClientResult<()>;
    async fn close(&self) -> ClientResult<()>;
}

/// WebSocket Transport Implementation
pub struct WsTransport {
    url: String,
    reader: Mutex<SplitStream<WsStream>>,
    writer: Mutex<SplitSink<WsStream, Message>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> ClientResult<Self> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        tracing::info!(url = %url, "WebSocket connected");
        let (writer, reader) = stream.split();
        Ok(Self {
            url: url.to_string(),
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        })
    }
}

impl fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsTransport")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn read_frame(&self) -> ClientResult<Option<String>> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => {
                        tracing::debug!(len = data.len(), "Skipping non-UTF-8 binary frame");
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "WebSocket closed by server");
                    return Ok(None);
                }
                Some(Ok(_)) => {} // Ping, Pong, raw frames
                Some(Err(e)) => {
                    return match ClientError::from(e) {
                        ClientError::ConnectionClosed => Ok(None),
                        other => Err(other),
                    };
                }
                None => return Ok(None),
            }
        }
    }

    async fn write_frame(&self, frame: String) -> ClientResult<()> {
        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&self) -> ClientResult<()> {
        let mut writer = self.writer.lock().await;
        writer.close().await?;
        Ok(())
    }
}

/// Memory Transport Implementation (in-process peer, used by tests)
#[derive(Debug)]
pub struct MemoryTransport {
    /// Frames FROM the peer
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
    /// Frames TO the peer
    tx: mpsc::UnboundedSender<String>,
}

/// Far end of a [`MemoryTransport`]
#[derive(Debug)]
pub struct MemoryPeer {
    /// Push frames to the client; dropping it closes the connection
    pub inbound: mpsc::UnboundedSender<String>,
    /// Frames written by the client
    pub outbound: mpsc::UnboundedReceiver<String>,
}

impl MemoryTransport {
    /// Create a connected transport/peer pair
    pub fn pair() -> (Self, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: Mutex::new(inbound_rx),
                tx: outbound_tx,
            },
            MemoryPeer {
                inbound: inbound_tx,
                outbound: outbound_rx,
            },
        )
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_frame(&self) -> ClientResult<Option<String>> {
        let mut rx = self.rx.lock().await;
        Ok(rx.recv().await)
    }

    async fn write_frame(&self, frame: String) -> ClientResult<()> {
        self.tx
            .send(frame)
            .map_err(|_| ClientError::ConnectionClosed)
    }

    async fn close(&self) -> ClientResult<()> {
        self.rx.lock().await.close();
        Ok(())
    }
}
