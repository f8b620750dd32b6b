use strum::FromRepr;

/// Close codes sent by the relay, in the private-use range (4000-4999).
///
/// Clients interpret these to tell an ordinary departure from a failure, so the
/// numeric values are part of the wire contract.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
pub enum CloseCode {
    /// Sent to the player when the host's connection went away.
    HostDisconnected = 4001,
    /// Sent to the host when the player's connection went away.
    PlayerDisconnected = 4002,
    /// The joining connection named a room that does not exist or is already full.
    NoRoom = 4003,
    /// The relay reached its room limit.
    CannotCreateRoom = 4004,
}

impl CloseCode {
    pub fn from_code(code: u16) -> Option<Self> {
        Self::from_repr(code)
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Short human-readable reason placed in the close frame.
    pub fn reason(self) -> &'static str {
        match self {
            CloseCode::HostDisconnected => "host disconnected",
            CloseCode::PlayerDisconnected => "player disconnected",
            CloseCode::NoRoom => "no such room",
            CloseCode::CannotCreateRoom => "room limit reached",
        }
    }
}
