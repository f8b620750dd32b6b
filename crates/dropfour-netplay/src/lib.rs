//! Dropfour Netplay Client Library
//!
//! Two participants play one game through the room relay. The authoritative
//! peer creates the room and owns the only rules engine; the mirror peer joins
//! with the room code and only reflects what it is told.
//!
//! # Architecture
//!
//! - [`session`]: session events, actions and the [`RemoteGame`] surface
//! - [`authority`]: sans-IO state machine of the authoritative peer
//! - [`mirror`]: sans-IO state machine of the mirror peer
//! - [`handler`]: async driver running either state machine
//! - [`peer`]: user-facing handles ([`AuthoritativePeer`], [`MirrorPeer`])
//! - [`ws_client`]: async WebSocket client for the relay
//! - [`error`]: Error types

pub mod authority;
pub mod error;
pub mod handler;
pub mod mirror;
pub mod peer;
pub mod session;
pub mod ws_client;

// Re-export commonly used types
pub use authority::{AuthorityPhase, AuthorityState};
pub use dropfour_core::{Player, Subscription};
pub use error::NetplayError;
pub use handler::{NetplayConfig, SessionCommand, SessionHandler};
pub use mirror::{MirrorPhase, MirrorState};
pub use peer::{AuthoritativePeer, MirrorPeer};
pub use session::{Action, PeerProtocol, RemoteGame, RoomCodeState, SessionEvent};
pub use ws_client::{WsClientCommand, WsClientEvent, WsClientHandle, connect};
