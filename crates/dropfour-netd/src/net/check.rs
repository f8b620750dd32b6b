//! Plain HTTP side of the listener: the room existence check.
//!
//! The request head is read and parsed up front. WebSocket upgrades are then
//! replayed into the handshake (see [`replay`]), everything else is answered here.

use std::io::Cursor;

use dropfour_netproto::RoomCheck;
use dropfour_netproto::room::CHECK_PATH_PREFIX;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::room::state::RoomRegistry;

/// Largest request head accepted before the handshake.
pub const MAX_HEAD_LEN: usize = 16 * 1024;

const MAX_HEADERS: usize = 64;
const READ_CHUNK: usize = 2048;

/// What the first request on a connection asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// A complete request head without a WebSocket upgrade.
    Http { path: String },
    /// An upgrade request; the raw head goes to the WebSocket handshake.
    WebSocket,
    /// Answered with this status and nothing else.
    Rejected(&'static str),
    /// Peer went away before finishing the head.
    Closed,
}

/// Read until `buf` holds a full request head.
///
/// Every byte read stays in `buf` so an upgrade can be replayed.
pub async fn read_head<R>(stream: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Head>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Head::Closed);
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(head) = parse_head(buf) {
            return Ok(head);
        }
        if buf.len() >= MAX_HEAD_LEN {
            return Ok(Head::Rejected("431 Request Header Fields Too Large"));
        }
    }
}

/// `None` while the head is still incomplete.
fn parse_head(buf: &[u8]) -> Option<Head> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    match req.parse(buf) {
        Ok(httparse::Status::Partial) => None,
        Ok(httparse::Status::Complete(_)) => {
            let upgrade = req.headers.iter().any(|h| {
                h.name.eq_ignore_ascii_case("upgrade")
                    && h.value.eq_ignore_ascii_case(b"websocket")
            });
            if upgrade {
                Some(Head::WebSocket)
            } else {
                Some(Head::Http {
                    path: req.path.unwrap_or("/").to_string(),
                })
            }
        }
        Err(httparse::Error::TooManyHeaders) => {
            Some(Head::Rejected("431 Request Header Fields Too Large"))
        }
        Err(_) => Some(Head::Rejected("400 Bad Request")),
    }
}

/// Put the consumed `head` back in front of `read` for the WebSocket handshake.
pub fn replay<R, W>(
    head: Vec<u8>,
    read: R,
    write: W,
) -> impl AsyncRead + AsyncWrite + Unpin + Send
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    tokio::io::join(Cursor::new(head).chain(read), write)
}

/// Response for a plain HTTP request: `(status line, json body)`.
pub fn route(target: &str, registry: &RoomRegistry) -> (&'static str, Option<String>) {
    let path = target.split_once('?').map_or(target, |(path, _)| path);

    match path.strip_prefix(CHECK_PATH_PREFIX) {
        Some(code) => {
            let check = RoomCheck {
                exist: registry.is_joinable(code),
            };
            match serde_json::to_string(&check) {
                Ok(body) => ("200 OK", Some(body)),
                Err(_) => ("500 Internal Server Error", None),
            }
        }
        None => ("404 Not Found", None),
    }
}

/// Write the response for `path`, then close.
pub async fn respond<W>(stream: W, path: &str, registry: &RoomRegistry) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let (status, body) = route(path, registry);
    write_response(stream, status, &body.unwrap_or_default()).await
}

pub async fn write_response<W>(mut stream: W, status: &str, body: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::room::state::PeerLink;

    #[test]
    fn upgrade_requests_go_to_the_handshake() {
        let head = b"GET /room HTTP/1.1\r\nHost: x\r\n\
            Connection: Upgrade\r\nUpgrade: WebSocket\r\n\r\n";
        assert_eq!(parse_head(head), Some(Head::WebSocket));
    }

    #[test]
    fn plain_get_is_http() {
        let head = b"GET /check/0042 HTTP/1.1\r\nHost: x\r\n\r\n";
        assert_eq!(
            parse_head(head),
            Some(Head::Http {
                path: "/check/0042".into()
            })
        );
        assert_eq!(parse_head(b"GET /check/0042 HTTP/1.1\r\nHost"), None);
        assert_eq!(
            parse_head(b"\x16\x03\x01 garbage\r\n\r\n"),
            Some(Head::Rejected("400 Bad Request"))
        );
    }

    #[tokio::test]
    async fn large_head_arriving_in_pieces_is_read_whole() {
        let cookie = "a".repeat(5000);
        let request = format!("GET /check/1234 HTTP/1.1\r\nHost: x\r\nCookie: {cookie}\r\n\r\n");
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            client.write_all(request.as_bytes()).await.unwrap();
            client
        });

        let mut buf = Vec::new();
        let head = read_head(&mut server, &mut buf).await.unwrap();
        assert_eq!(
            head,
            Head::Http {
                path: "/check/1234".into()
            }
        );
        assert!(buf.len() > 5000);
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn endless_head_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let writer = tokio::spawn(async move {
            let _ = client.write_all(b"GET /check/1234 HTTP/1.1\r\nCookie: ").await;
            let filler = vec![b'a'; MAX_HEAD_LEN];
            let _ = client.write_all(&filler).await;
            client
        });

        let mut buf = Vec::new();
        assert_eq!(
            read_head(&mut server, &mut buf).await.unwrap(),
            Head::Rejected("431 Request Header Fields Too Large")
        );
        drop(server);
        let _ = writer.await;
    }

    #[tokio::test]
    async fn replay_yields_head_then_rest() {
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(b" world").await.unwrap();
        drop(client);

        let (read, write) = tokio::io::split(server);
        let mut io = replay(b"hello".to_vec(), read, write);
        let mut out = String::new();
        io.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn check_reports_joinable_rooms_only() {
        let registry = RoomRegistry::default();
        let (tx, _rx) = mpsc::channel(1);
        let room = registry
            .create(PeerLink::new(1, tx.clone(), CancellationToken::new()))
            .unwrap();

        let path = format!("{CHECK_PATH_PREFIX}{}", room.code());
        assert_eq!(
            route(&path, &registry),
            ("200 OK", Some(r#"{"exist":true}"#.to_string()))
        );

        registry
            .join(room.code(), PeerLink::new(2, tx, CancellationToken::new()))
            .unwrap();
        assert_eq!(
            route(&path, &registry),
            ("200 OK", Some(r#"{"exist":false}"#.to_string()))
        );
        assert_eq!(
            route("/check/", &registry).1.as_deref(),
            Some(r#"{"exist":false}"#)
        );
        assert_eq!(route("/nope", &registry), ("404 Not Found", None));
    }
}
