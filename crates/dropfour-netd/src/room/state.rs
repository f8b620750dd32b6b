//! Room state management.
//!
//! A room pairs exactly two connections: the host that created it and the
//! player that joined with its code. The registry only tracks who is in which
//! room; frames are forwarded by the connection tasks themselves through the
//! links stored here.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use dropfour_netproto::CloseCode;
use dropfour_netproto::constants::ROOM_CODE_SPACE;
use dropfour_netproto::room::format_room_code;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::net::inbound::ConnId;
use crate::net::outbound::{Outbound, OutboundTx};

/// Default ceiling on simultaneously active rooms.
pub const DEFAULT_MAX_ROOMS: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room limit reached ({limit})")]
    RoomCapacityExceeded { limit: usize },
    #[error("no joinable room with code {0}")]
    NoSuchRoom(String),
}

impl RegistryError {
    /// Close code reported to the rejected connection.
    pub fn close_code(&self) -> CloseCode {
        match self {
            RegistryError::RoomCapacityExceeded { .. } => CloseCode::CannotCreateRoom,
            RegistryError::NoSuchRoom(_) => CloseCode::NoRoom,
        }
    }
}

/// Which end of a room a connection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Host,
    Player,
}

impl Side {
    /// Close code sent to the counterpart when this side leaves.
    pub fn departure_code(self) -> CloseCode {
        match self {
            Side::Host => CloseCode::HostDisconnected,
            Side::Player => CloseCode::PlayerDisconnected,
        }
    }
}

/// Handle used to reach a connection from another connection's task.
#[derive(Debug, Clone)]
pub struct PeerLink {
    pub conn_id: ConnId,
    outbound: OutboundTx,
    cancel: CancellationToken,
}

impl PeerLink {
    pub fn new(conn_id: ConnId, outbound: OutboundTx, cancel: CancellationToken) -> Self {
        Self {
            conn_id,
            outbound,
            cancel,
        }
    }

    /// Queue an item for this connection's writer. `false` once the writer is gone.
    pub async fn send(&self, item: Outbound) -> bool {
        self.outbound.send(item).await.is_ok()
    }

    /// Queue a close frame behind anything already queued, then stop the reader.
    pub async fn close(&self, code: CloseCode) {
        let _ = self.outbound.send(Outbound::Close(code)).await;
        self.cancel.cancel();
    }
}

#[derive(Debug)]
pub struct Room {
    code: String,
    host: PeerLink,
    player: OnceLock<PeerLink>,
}

impl Room {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_paired(&self) -> bool {
        self.player.get().is_some()
    }

    /// Link of the connection opposite `side`, if there is one yet.
    pub fn counterpart(&self, side: Side) -> Option<&PeerLink> {
        match side {
            Side::Host => self.player.get(),
            Side::Player => Some(&self.host),
        }
    }
}

/// Code -> room map shared by all connection tasks.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    max_rooms: usize,
}

impl RoomRegistry {
    /// The ceiling is capped at the number of distinct codes.
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            max_rooms: max_rooms.min(ROOM_CODE_SPACE as usize),
        }
    }

    pub fn max_rooms(&self) -> usize {
        self.max_rooms
    }

    /// Register a new room with `host` and a fresh code.
    pub fn create(&self, host: PeerLink) -> Result<Arc<Room>, RegistryError> {
        let mut rooms = self.rooms.lock();
        if rooms.len() >= self.max_rooms {
            return Err(RegistryError::RoomCapacityExceeded {
                limit: self.max_rooms,
            });
        }

        // Terminates: at least one code is free below the ceiling.
        let code = loop {
            let candidate = format_room_code(rand::random_range(0..ROOM_CODE_SPACE));
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Arc::new(Room {
            code: code.clone(),
            host,
            player: OnceLock::new(),
        });
        rooms.insert(code, Arc::clone(&room));
        Ok(room)
    }

    /// Attach `player` to the unpaired room named `code`.
    pub fn join(&self, code: &str, player: PeerLink) -> Result<Arc<Room>, RegistryError> {
        let rooms = self.rooms.lock();
        let room = rooms
            .get(code)
            .ok_or_else(|| RegistryError::NoSuchRoom(code.to_string()))?;
        room.player
            .set(player)
            .map_err(|_| RegistryError::NoSuchRoom(code.to_string()))?;
        Ok(Arc::clone(room))
    }

    /// Whether a room with `code` exists and still waits for a player.
    pub fn is_joinable(&self, code: &str) -> bool {
        self.rooms
            .lock()
            .get(code)
            .is_some_and(|room| !room.is_paired())
    }

    /// Remove `room` on behalf of the connection at `side` and return the link
    /// that must be told about it.
    ///
    /// Only the first release of a room returns a counterpart; a later call for
    /// the same room (or one whose code was already reused) removes nothing.
    pub fn release(&self, room: &Arc<Room>, side: Side) -> Option<PeerLink> {
        let mut rooms = self.rooms.lock();
        let current = rooms.get(room.code())?;
        if !Arc::ptr_eq(current, room) {
            return None;
        }
        rooms.remove(room.code());
        room.counterpart(side).cloned()
    }

    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROOMS)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use dropfour_netproto::room::is_room_code;
    use tokio::sync::mpsc;

    use super::*;

    fn link(conn_id: ConnId) -> (PeerLink, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(8);
        (PeerLink::new(conn_id, tx, CancellationToken::new()), rx)
    }

    #[test]
    fn codes_are_unique_numeric_and_bounded() {
        let registry = RoomRegistry::new(50);
        let mut codes = HashSet::new();
        for id in 0..50 {
            let room = registry.create(link(id).0).unwrap();
            assert!(is_room_code(room.code()));
            assert!(codes.insert(room.code().to_string()));
        }
        assert_eq!(registry.len(), 50);

        let err = registry.create(link(99).0).unwrap_err();
        assert_eq!(err, RegistryError::RoomCapacityExceeded { limit: 50 });
        assert_eq!(err.close_code(), CloseCode::CannotCreateRoom);
        assert_eq!(registry.len(), 50);
    }

    #[test]
    fn every_code_can_be_handed_out() {
        let registry = RoomRegistry::new(usize::MAX);
        assert_eq!(registry.max_rooms(), ROOM_CODE_SPACE as usize);

        let (host, _rx) = link(1);
        for _ in 0..ROOM_CODE_SPACE {
            registry.create(host.clone()).unwrap();
        }
        assert!(registry.create(host).is_err());
    }

    #[test]
    fn join_pairs_once() {
        let registry = RoomRegistry::default();
        let room = registry.create(link(1).0).unwrap();
        let code = room.code().to_string();
        assert!(registry.is_joinable(&code));

        let joined = registry.join(&code, link(2).0).unwrap();
        assert!(Arc::ptr_eq(&room, &joined));
        assert!(!registry.is_joinable(&code));
        assert_eq!(room.counterpart(Side::Host).map(|l| l.conn_id), Some(2));
        assert_eq!(room.counterpart(Side::Player).map(|l| l.conn_id), Some(1));

        let err = registry.join(&code, link(3).0).unwrap_err();
        assert_eq!(err.close_code(), CloseCode::NoRoom);
        assert_eq!(room.counterpart(Side::Host).map(|l| l.conn_id), Some(2));
    }

    #[test]
    fn unknown_code_does_not_touch_other_rooms() {
        let registry = RoomRegistry::default();
        let room = registry.create(link(1).0).unwrap();
        let missing = if room.code() == "0000" { "0001" } else { "0000" };

        assert_eq!(
            registry.join(missing, link(2).0).unwrap_err(),
            RegistryError::NoSuchRoom(missing.to_string())
        );
        assert!(registry.join("", link(3).0).is_err());
        assert!(!registry.is_joinable(missing));
        assert!(registry.is_joinable(room.code()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_returns_counterpart_only_once() {
        let registry = RoomRegistry::default();
        let room = registry.create(link(1).0).unwrap();
        registry.join(room.code(), link(2).0).unwrap();

        let peer = registry.release(&room, Side::Player).unwrap();
        assert_eq!(peer.conn_id, 1);
        assert!(registry.is_empty());

        assert!(registry.release(&room, Side::Host).is_none());
    }

    #[test]
    fn unpaired_release_has_no_counterpart() {
        let registry = RoomRegistry::default();
        let room = registry.create(link(1).0).unwrap();
        assert!(registry.release(&room, Side::Host).is_none());
        assert!(registry.is_empty());
        assert!(!registry.is_joinable(room.code()));
    }

    #[test]
    fn stale_release_leaves_reused_code_alone() {
        let registry = RoomRegistry::new(1);
        let old = registry.create(link(1).0).unwrap();
        registry.release(&old, Side::Host);

        // Only one code can exist at a time; keep creating until it is reused.
        let mut new = registry.create(link(2).0).unwrap();
        while new.code() != old.code() {
            registry.release(&new, Side::Host);
            new = registry.create(link(2).0).unwrap();
        }

        assert!(registry.release(&old, Side::Host).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.is_joinable(new.code()));
    }

    #[tokio::test]
    async fn close_queues_behind_pending_frames_and_cancels() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let link = PeerLink::new(7, tx, cancel.clone());

        assert!(link.send(Outbound::Frame("early".into())).await);
        link.close(Side::Host.departure_code()).await;

        assert!(matches!(rx.recv().await, Some(Outbound::Frame(_))));
        assert!(matches!(
            rx.recv().await,
            Some(Outbound::Close(CloseCode::HostDisconnected))
        ));
        assert!(cancel.is_cancelled());
    }
}
