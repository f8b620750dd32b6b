//! Wire formats shared by the relay server and the session peers.
//!
//! - [`room`]: what the relay itself says (room code handshake, existence check, paths)
//! - [`close_code`]: application close codes sent by the relay
//! - [`messages`]: game messages exchanged between the two peers through the relay
//! - [`codec`]: binary framing of game messages

pub mod close_code;
pub mod codec;
pub mod constants;
pub mod error;
pub mod messages;
pub mod room;

pub use close_code::CloseCode;
pub use codec::{decode_message, encode_message};
pub use dropfour_core::Player;
pub use error::ProtoError;
pub use messages::{HostMessage, Message, PeerMessage};
pub use room::{RoomAssigned, RoomCheck};
