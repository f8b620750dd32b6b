//! Game messages carried inside relayed frames.
//!
//! The relay never looks at these. Each frame holds exactly one message; the
//! variant tag makes it self-describing. There are no sequence numbers, the
//! relay's in-order delivery is the only ordering guarantee.

use dropfour_core::{GameEvent, Player};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// A trait for all peer-to-peer protocol messages.
pub trait Message: Serialize + DeserializeOwned + Send + 'static {
    /// Variant name, for logs.
    fn kind(&self) -> &'static str;
}

/// Authority -> mirror.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum HostMessage {
    /// Role given to the mirror. The authority plays the other side.
    RoleAssignment { player_turn: Player },
    NewStone { player: Player, column: u8, row: u8 },
    PlayerSwitch { next: Player },
    /// `winner` is `None` for a draw.
    GameOver { winner: Option<Player> },
    Resign,
}

/// Mirror -> authority.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum PeerMessage {
    Hello,
    Ready,
    PlaceStone { column: u8 },
    Resign,
}

impl Message for HostMessage {
    fn kind(&self) -> &'static str {
        self.into()
    }
}

impl Message for PeerMessage {
    fn kind(&self) -> &'static str {
        self.into()
    }
}

impl From<GameEvent> for HostMessage {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::NewStone {
                player,
                column,
                row,
            } => HostMessage::NewStone {
                player,
                column,
                row,
            },
            GameEvent::PlayerChange { next } => HostMessage::PlayerSwitch { next },
            GameEvent::GameOver { winner } => HostMessage::GameOver { winner },
        }
    }
}
