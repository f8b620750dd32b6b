//! Async WebSocket client for the room relay.
//!
//! This module provides a tokio-based client that handles:
//! - Connection to the relay
//! - Splitting the socket into reader/writer loops
//! - Reporting the close code the relay ended the connection with

use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, trace, warn};

use crate::error::NetplayError;

/// Capacity of the command queue feeding the writer.
const COMMAND_QUEUE_LEN: usize = 256;

/// Events sent from the WebSocket client to the session handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsClientEvent {
    /// The handshake completed. Always the first event.
    Connected,
    /// A text frame (only the relay itself sends these).
    Text(String),
    /// A binary frame relayed from the other peer.
    Frame(Bytes),
    /// The connection is gone. Sent exactly once, always last.
    Closed { code: Option<u16>, reason: String },
}

/// Commands sent to the WebSocket client from the session handler.
#[derive(Debug)]
pub enum WsClientCommand {
    /// Send one binary frame.
    Send(Bytes),
    /// Start the close handshake and stop writing.
    Close,
}

/// Handle for sending commands to a running client.
#[derive(Debug, Clone)]
pub struct WsClientHandle {
    cmd_tx: mpsc::Sender<WsClientCommand>,
}

impl WsClientHandle {
    pub async fn send(&self, frame: Bytes) -> Result<(), NetplayError> {
        self.cmd_tx
            .send(WsClientCommand::Send(frame))
            .await
            .map_err(|_| NetplayError::ChannelSend)
    }

    /// Request close. Harmless if the connection is already gone.
    pub async fn close(&self) {
        let _ = self.cmd_tx.send(WsClientCommand::Close).await;
    }
}

/// Connect to `url` and spawn the reader/writer tasks.
///
/// Events are delivered on `event_tx`, starting with [`WsClientEvent::Connected`].
pub async fn connect(
    url: &str,
    event_tx: mpsc::Sender<WsClientEvent>,
) -> Result<WsClientHandle, NetplayError> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| NetplayError::ConnectionFailed(e.to_string()))?;
    info!(url, "Connected to relay");

    let (write, read) = ws.split();
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_LEN);

    // Queued before the reader starts so it is always first.
    let _ = event_tx.send(WsClientEvent::Connected).await;

    tokio::spawn(async move {
        writer_loop(write, cmd_rx).await;
    });
    tokio::spawn(async move {
        reader_loop(read, event_tx).await;
    });

    Ok(WsClientHandle { cmd_tx })
}

async fn writer_loop(
    mut write: impl Sink<Message, Error = tungstenite::Error> + Unpin,
    mut cmd_rx: mpsc::Receiver<WsClientCommand>,
) {
    loop {
        match cmd_rx.recv().await {
            Some(WsClientCommand::Send(frame)) => {
                trace!("Sending {} bytes to relay", frame.len());
                if let Err(e) = write.send(Message::Binary(frame)).await {
                    warn!("Write error: {}", e);
                    break;
                }
            }
            Some(WsClientCommand::Close) => {
                debug!("Close command received");
                break;
            }
            None => {
                debug!("Command channel closed");
                break;
            }
        }
    }

    // Attempt graceful close
    let _ = write.close().await;
}

async fn reader_loop(
    mut read: impl Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    event_tx: mpsc::Sender<WsClientEvent>,
) {
    let mut close_code = None;
    let mut reason = "connection ended".to_string();

    while let Some(next) = read.next().await {
        let event = match next {
            Ok(Message::Binary(frame)) => WsClientEvent::Frame(frame),
            Ok(Message::Text(text)) => WsClientEvent::Text(text.as_str().to_owned()),
            Ok(Message::Close(frame)) => {
                if let Some(frame) = frame {
                    close_code = Some(u16::from(frame.code));
                    reason = frame.reason.as_str().to_owned();
                }
                debug!(?close_code, %reason, "Relay closed connection");
                // Keep reading so tungstenite can finish the close handshake.
                continue;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
            Err(e) => {
                if close_code.is_none() {
                    reason = e.to_string();
                }
                break;
            }
        };
        if event_tx.send(event).await.is_err() {
            warn!("Event channel closed");
            return;
        }
    }

    let _ = event_tx
        .send(WsClientEvent::Closed {
            code: close_code,
            reason,
        })
        .await;
}
