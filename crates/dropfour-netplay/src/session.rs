//! Session vocabulary shared by both peer roles.
//!
//! Each role is a sans-IO state machine implementing [`PeerProtocol`]: inputs
//! come from the transport or from the local user, outputs are [`Action`]s that
//! the async [`SessionHandler`](crate::handler::SessionHandler) carries out.

use std::future::Future;

use dropfour_core::{GameEvent, Player, Subscription};
use dropfour_netproto::Message;

use crate::error::NetplayError;

/// What local subscribers observe during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Both peers are ready. `my_turn` is the local participant's role.
    Start { my_turn: Player },
    NewStone { player: Player, column: u8, row: u8 },
    PlayerChange { next: Player },
    /// `winner` is `None` for a draw.
    GameOver { winner: Option<Player> },
    OpponentLeft,
    OpponentResigned,
    RoomCreationFailed,
    RoomNotFound,
    /// The session broke for a reason that has no better name.
    SomethingWentWrong,
}

impl From<GameEvent> for SessionEvent {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::NewStone {
                player,
                column,
                row,
            } => SessionEvent::NewStone {
                player,
                column,
                row,
            },
            GameEvent::PlayerChange { next } => SessionEvent::PlayerChange { next },
            GameEvent::GameOver { winner } => SessionEvent::GameOver { winner },
        }
    }
}

/// Side effect requested by a protocol state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<M> {
    /// Encode and send a message to the other peer.
    Send(M),
    /// Deliver an event to local subscribers.
    Emit(SessionEvent),
    /// The relay assigned this room code.
    RoomCode(String),
    /// Close the transport.
    Close,
}

/// Sans-IO protocol of one peer role.
///
/// Once a state machine reports [`is_terminal`](PeerProtocol::is_terminal) it
/// returns no further actions except for a repeated close.
pub trait PeerProtocol: Send + 'static {
    /// Message type this role sends.
    type Outgoing: Message;

    fn on_open(&mut self) -> Vec<Action<Self::Outgoing>>;
    fn on_text(&mut self, text: &str) -> Vec<Action<Self::Outgoing>>;
    fn on_frame(&mut self, frame: &[u8]) -> Vec<Action<Self::Outgoing>>;
    /// The transport is gone. `code` is the close code, if one was received.
    fn on_closed(&mut self, code: Option<u16>) -> Vec<Action<Self::Outgoing>>;

    fn place_stone(&mut self, column: u8) -> Vec<Action<Self::Outgoing>>;
    fn resign(&mut self) -> Vec<Action<Self::Outgoing>>;
    /// End the session without telling anyone.
    fn destroy(&mut self) -> Vec<Action<Self::Outgoing>>;

    fn is_terminal(&self) -> bool;
}

/// Room code as seen by [`RemoteGame::room_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCodeState {
    Pending,
    Assigned(String),
    /// The session ended before a code was assigned.
    Failed,
}

/// Shared surface of both peer roles.
pub trait RemoteGame {
    /// Code of the room this session plays in.
    ///
    /// Resolves once the relay assigned it; fails if the room could not be created.
    fn room_code(&self) -> impl Future<Output = Result<String, NetplayError>> + Send;

    /// Request a stone in `column` for the local participant.
    fn place_stone(&self, column: u8);

    fn resign(&self);

    fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static;

    /// Close the session silently.
    fn destroy(&self);
}
