//! WebSocket event connection to a ComfyUI instance.
//!
//! [`ComfyUIClient`] holds the WebSocket base URL. Call
//! [`ComfyUIClient::connect`] with a session id to open a
//! [`ComfyUIConnection`] that receives the events for jobs submitted
//! under that id.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::channel::EventStream;
use crate::messages::{parse_message, ComfyUIMessage};

/// Connection settings for the ComfyUI event socket.
#[derive(Debug, Clone)]
pub struct ComfyUIClient {
    ws_url: String,
}

/// A live WebSocket connection scoped to one session id.
pub struct ComfyUIConnection {
    /// Session id sent during the WebSocket handshake.
    pub session_id: String,
    ws_stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    closed: bool,
}

impl ComfyUIClient {
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:8188`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to `/ws?clientId=<session_id>`.
    ///
    /// ComfyUI routes execution events for prompts submitted with the
    /// same `client_id` to this socket only.
    pub async fn connect(&self, session_id: &str) -> Result<ComfyUIConnection, ComfyUIClientError> {
        let url = format!("{}/ws?clientId={}", self.ws_url, session_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            ComfyUIClientError::Connection(format!(
                "Failed to connect to ComfyUI at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(session_id = %session_id, "Connected to ComfyUI at {}", self.ws_url);

        Ok(ComfyUIConnection {
            session_id: session_id.to_string(),
            ws_stream,
            closed: false,
        })
    }
}

#[async_trait]
impl EventStream for ComfyUIConnection {
    /// Next parseable text message. Binary previews, control frames, and
    /// messages of unknown type are skipped. `None` means the server
    /// closed the socket.
    async fn next_message(&mut self) -> Result<Option<ComfyUIMessage>, ComfyUIClientError> {
        while let Some(frame) = self.ws_stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match parse_message(&text) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => {
                        tracing::trace!(
                            session_id = %self.session_id,
                            error = %e,
                            raw_message = %text,
                            "Skipping unrecognised ComfyUI message",
                        );
                    }
                },
                Ok(Message::Binary(_)) => {
                    // Latent preview images.
                    tracing::trace!(session_id = %self.session_id, "Ignoring binary message");
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    tracing::info!(session_id = %self.session_id, ?frame, "ComfyUI WebSocket closed");
                    self.closed = true;
                    return Ok(None);
                }
                Err(e) => {
                    return Err(ComfyUIClientError::Protocol(e.to_string()));
                }
            }
        }
        self.closed = true;
        Ok(None)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.ws_stream.close(None).await {
            tracing::debug!(session_id = %self.session_id, error = %e, "WebSocket close failed");
        } else {
            tracing::debug!(session_id = %self.session_id, "WebSocket closed");
        }
    }
}

/// Errors that can occur on the event connection.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIClientError {
    /// Failed to establish the initial WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
