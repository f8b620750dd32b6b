//! Netplay error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetplayError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("room could not be created")]
    RoomCreationFailed,

    #[error("session closed")]
    SessionClosed,

    #[error("channel send error")]
    ChannelSend,

    #[error("session already active")]
    AlreadyConnected,
}
