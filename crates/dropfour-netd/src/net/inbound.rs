use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::outbound::Outbound;
use crate::room::state::{Room, Side};

/// Unique connection identifier assigned by the server.
pub type ConnId = u64;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_conn_id() -> ConnId {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Forward every data frame read from `read` to the other side of `room`.
///
/// Frames read while the room has no counterpart are dropped. Payloads are
/// never inspected. Runs until the connection ends or `cancel` fires and
/// returns a best-effort reason for logging.
pub async fn relay_frames<R>(
    mut read: R,
    room: &Room,
    side: Side,
    conn_id: ConnId,
    cancel: &CancellationToken,
) -> String
where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let next = tokio::select! {
            next = read.next() => next,
            _ = cancel.cancelled() => return "cancelled by server".to_string(),
        };

        let msg = match next {
            None => return "eof".to_string(),
            Some(Err(e)) => return format!("read error: {e}"),
            Some(Ok(msg)) => msg,
        };

        match msg {
            Message::Binary(_) | Message::Text(_) => {
                let Some(peer) = room.counterpart(side) else {
                    trace!(conn_id, room_code = room.code(), "dropping frame before pairing");
                    continue;
                };
                if !peer.send(Outbound::Frame(msg)).await {
                    debug!(conn_id, peer = peer.conn_id, "counterpart writer gone");
                }
            }
            Message::Close(frame) => {
                return match frame {
                    Some(frame) => format!("closed by client ({})", frame.code),
                    None => "closed by client".to_string(),
                };
            }
            // Ping/pong are answered by tungstenite itself.
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}
