use dropfour_netproto::CloseCode;
use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    self, Message, Utf8Bytes,
    protocol::{CloseFrame, frame::coding::CloseCode as WsCloseCode},
};

/// Capacity of each connection's outbound queue.
pub const OUTBOUND_QUEUE_LEN: usize = 256;

/// Work item for a connection's writer task.
#[derive(Debug)]
pub enum Outbound {
    /// A frame to write as-is.
    Frame(Message),
    /// Write a close frame with this code, then stop.
    Close(CloseCode),
}

/// Sender used to write to a connection. Order of submission is order on the wire.
pub type OutboundTx = mpsc::Sender<Outbound>;

/// Spawn a writer task that drains the outbound queue into the WebSocket sink.
///
/// Current behavior:
/// - Exits when the channel is closed or after writing a close frame.
/// - Returns an error if a socket write fails.
pub fn spawn_writer<S>(
    mut write: S,
    mut rx: mpsc::Receiver<Outbound>,
) -> tokio::task::JoinHandle<anyhow::Result<()>>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            match item {
                Outbound::Frame(msg) => write.send(msg).await?,
                Outbound::Close(code) => {
                    write.send(close_message(code)).await?;
                    break;
                }
            }
        }
        // Flushes any pending close reply queued by the read half.
        let _ = write.close().await;
        Ok(())
    })
}

pub fn close_message(code: CloseCode) -> Message {
    Message::Close(Some(CloseFrame {
        code: WsCloseCode::from(code.code()),
        reason: Utf8Bytes::from_static(code.reason()),
    }))
}
