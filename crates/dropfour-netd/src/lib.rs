//! Room relay server library.
//!
//! Pairs two WebSocket connections per room and forwards their frames to each
//! other without looking at them. The accept loop lives in [`net::tcp`]; room
//! bookkeeping lives in [`room::state`].

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::room::state::{DEFAULT_MAX_ROOMS, RoomRegistry};

// Export modules publicly for testing
pub mod net;
pub mod room;

/// Runtime configuration for the relay.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Ceiling on simultaneously active rooms.
    pub games_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            games_limit: DEFAULT_MAX_ROOMS,
        }
    }
}

/// Bind `addr` and serve until the listener fails.
pub async fn bind_and_run(addr: SocketAddr, config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    run_server(listener, config).await
}

/// Serve rooms on an already bound listener.
///
/// This is the core server logic, extracted for testability.
pub async fn run_server(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let registry = Arc::new(RoomRegistry::new(config.games_limit));
    info!(
        addr = %listener.local_addr()?,
        games_limit = registry.max_rooms(),
        "Relay server started"
    );
    net::tcp::run_tcp_listener_with_listener(listener, registry).await
}
