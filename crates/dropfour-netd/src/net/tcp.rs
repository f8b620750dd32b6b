use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dropfour_netproto::RoomAssigned;
use dropfour_netproto::room::{ROOM_PATH, code_from_query};
use futures_util::{Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::{
    self, Message,
    handshake::server::{ErrorResponse, Request, Response},
    http::StatusCode,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::check::{self, Head};
use super::inbound::{ConnId, next_conn_id, relay_frames};
use super::outbound::{OUTBOUND_QUEUE_LEN, Outbound, spawn_writer};
use crate::room::state::{PeerLink, RoomRegistry, Side};

/// Upper bound for reading the request head, and again for the WebSocket handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a rejected or departing connection is given to finish the close handshake.
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Run the accept loop on an existing listener.
pub async fn run_tcp_listener_with_listener(
    listener: TcpListener,
    registry: Arc<RoomRegistry>,
) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let conn_id = next_conn_id();

        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            handle_tcp_connection(stream, peer, conn_id, registry).await;
        });
    }
}

/// What a WebSocket connection asked for in its request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Create,
    Join(String),
}

/// Handle a single TCP connection. Public to allow embedding the server in other crates.
pub async fn handle_tcp_connection(
    stream: TcpStream,
    peer: SocketAddr,
    conn_id: ConnId,
    registry: Arc<RoomRegistry>,
) {
    let _ = stream.set_nodelay(true);
    let (mut read_half, write_half) = stream.into_split();

    let mut head = Vec::new();
    let parsed = check::read_head(&mut read_half, &mut head);
    let parsed = match tokio::time::timeout(HANDSHAKE_TIMEOUT, parsed).await {
        Ok(Ok(parsed)) => parsed,
        Ok(Err(e)) => {
            warn!(conn_id, %peer, "Failed to read request head: {}", e);
            return;
        }
        Err(_) => {
            debug!(conn_id, %peer, "Timed out waiting for request head");
            return;
        }
    };

    match parsed {
        Head::Closed => {}
        Head::Rejected(status) => {
            debug!(conn_id, %peer, status, "Rejected request head");
            let _ = check::write_response(write_half, status, "").await;
        }
        Head::Http { path } => {
            debug!(conn_id, %peer, %path, "Plain HTTP request");
            if let Err(e) = check::respond(write_half, &path, &registry).await {
                debug!(conn_id, %peer, "HTTP response failed: {}", e);
            }
        }
        Head::WebSocket => {
            let mut route = None;
            let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                if req.uri().path() != ROOM_PATH {
                    return Err(not_found());
                }
                route = Some(match code_from_query(req.uri().query()) {
                    Some(code) => Route::Join(code.to_string()),
                    None => Route::Create,
                });
                Ok(resp)
            };

            let stream = check::replay(head, read_half, write_half);
            let handshake = accept_hdr_async(stream, callback);
            let ws = match tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake).await {
                Ok(Ok(ws)) => ws,
                Ok(Err(e)) => {
                    warn!(conn_id, %peer, "WebSocket handshake failed: {}", e);
                    return;
                }
                Err(_) => {
                    warn!(conn_id, %peer, "WebSocket handshake timed out");
                    return;
                }
            };

            let Some(route) = route else {
                return;
            };
            handle_websocket(ws, route, peer, conn_id, &registry).await;
        }
    }
}

fn not_found() -> ErrorResponse {
    let mut resp = ErrorResponse::new(Some("not found".to_string()));
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp
}

async fn handle_websocket<S>(
    ws: S,
    route: Route,
    peer: SocketAddr,
    conn_id: ConnId,
    registry: &RoomRegistry,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + futures_util::Sink<Message, Error = tungstenite::Error>
        + Unpin
        + Send
        + 'static,
{
    let (write, mut read) = ws.split();

    // Outbound queue (frames and the final close).
    let (out_tx, out_rx) = mpsc::channel::<Outbound>(OUTBOUND_QUEUE_LEN);
    let writer = spawn_writer(write, out_rx);

    let cancel_token = CancellationToken::new();
    let link = PeerLink::new(conn_id, out_tx.clone(), cancel_token.clone());

    let joined = match route {
        Route::Create => registry.create(link).map(|room| (room, Side::Host)),
        Route::Join(code) => registry.join(&code, link).map(|room| (room, Side::Player)),
    };

    match joined {
        Ok((room, side)) => {
            match side {
                Side::Host => {
                    info!(
                        conn_id,
                        %peer,
                        room_code = room.code(),
                        rooms = registry.len(),
                        "Room created"
                    );
                    let assigned = RoomAssigned {
                        room_code: room.code().to_string(),
                    };
                    match assigned.to_json() {
                        Ok(text) => {
                            let _ = out_tx.send(Outbound::Frame(Message::text(text))).await;
                        }
                        Err(e) => warn!(conn_id, "Failed to encode room code: {}", e),
                    }
                }
                Side::Player => {
                    info!(conn_id, %peer, room_code = room.code(), "Room paired");
                }
            }

            let reason = relay_frames(&mut read, &room, side, conn_id, &cancel_token).await;
            debug!(conn_id, room_code = room.code(), %reason, "Connection ended");

            if let Some(counterpart) = registry.release(&room, side) {
                info!(
                    conn_id,
                    peer = counterpart.conn_id,
                    room_code = room.code(),
                    %reason,
                    "Room removed, closing counterpart"
                );
                counterpart.close(side.departure_code()).await;
            } else if !room.is_paired() {
                info!(conn_id, room_code = room.code(), %reason, "Unpaired room removed");
            }
            // Drops the links this task still holds so both writers can drain.
            drop(room);
        }
        Err(e) => {
            warn!(conn_id, %peer, "Rejected: {}", e);
            let _ = out_tx.send(Outbound::Close(e.close_code())).await;
        }
    }

    // Close outbound channel so writer can exit.
    drop(out_tx);

    // Await writer task; ignore errors here (connection is closing anyway).
    let _ = writer.await;

    // Let the client answer our close frame before the socket is dropped.
    let _ = tokio::time::timeout(CLOSE_GRACE, read.for_each(|_| async {})).await;
}

