//! The two peer roles as user-facing handles.
//!
//! Both are built in the same three steps: `new`, optional `subscribe`, then
//! `connect().await`. Commands issued before `connect` are queued and replayed
//! to the state machine once the driver runs.

use std::sync::Arc;

use dropfour_core::{Listeners, Player, Subscription};
use dropfour_netproto::room::{create_url, join_url};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::authority::AuthorityState;
use crate::error::NetplayError;
use crate::handler::{NetplayConfig, SessionCommand, SessionHandler};
use crate::mirror::MirrorState;
use crate::session::{PeerProtocol, RemoteGame, RoomCodeState, SessionEvent};
use crate::ws_client::{self, WsClientEvent};

/// Capacity of the transport event queue.
const EVENT_QUEUE_LEN: usize = 256;

/// State shared by both roles; `P` is handed to the driver on connect.
struct PeerCore<P: PeerProtocol> {
    url: String,
    pending: Mutex<Option<(P, mpsc::UnboundedReceiver<SessionCommand>)>>,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    listeners: Listeners<SessionEvent>,
    room_code_tx: Arc<watch::Sender<RoomCodeState>>,
    room_code_rx: watch::Receiver<RoomCodeState>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<P: PeerProtocol> PeerCore<P> {
    fn new(url: String, state: P, room_code: RoomCodeState) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (room_code_tx, room_code_rx) = watch::channel(room_code);
        Self {
            url,
            pending: Mutex::new(Some((state, command_rx))),
            command_tx,
            listeners: Listeners::new(),
            room_code_tx: Arc::new(room_code_tx),
            room_code_rx,
            driver: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<(), NetplayError> {
        let (state, command_rx) = self
            .pending
            .lock()
            .take()
            .ok_or(NetplayError::AlreadyConnected)?;

        let (event_tx, event_rx) = mpsc::channel::<WsClientEvent>(EVENT_QUEUE_LEN);
        let transport = match ws_client::connect(&self.url, event_tx).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!(url = %self.url, "Connection failed: {}", e);
                self.listeners.emit(&SessionEvent::SomethingWentWrong);
                self.room_code_tx.send_if_modified(|code| {
                    let pending = *code == RoomCodeState::Pending;
                    if pending {
                        *code = RoomCodeState::Failed;
                    }
                    pending
                });
                return Err(e);
            }
        };

        let handler = SessionHandler::new(
            state,
            transport,
            event_rx,
            command_rx,
            self.listeners.clone(),
            Arc::clone(&self.room_code_tx),
        );
        *self.driver.lock() = Some(tokio::spawn(handler.run()));
        Ok(())
    }

    async fn room_code(&self) -> Result<String, NetplayError> {
        let mut rx = self.room_code_rx.clone();
        let state = rx
            .wait_for(|state| *state != RoomCodeState::Pending)
            .await
            .map_err(|_| NetplayError::SessionClosed)?
            .clone();
        match state {
            RoomCodeState::Assigned(code) => Ok(code),
            RoomCodeState::Failed => Err(NetplayError::RoomCreationFailed),
            RoomCodeState::Pending => Err(NetplayError::SessionClosed),
        }
    }

    fn command(&self, cmd: SessionCommand) {
        // The driver is gone once the session ended; later commands are moot.
        let _ = self.command_tx.send(cmd);
    }

    fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(handler)
    }

    fn is_finished(&self) -> bool {
        self.driver
            .lock()
            .as_ref()
            .is_some_and(|driver| driver.is_finished())
    }
}

/// Creates a room and holds the authoritative game.
pub struct AuthoritativePeer {
    core: PeerCore<AuthorityState>,
    role: Player,
}

impl AuthoritativePeer {
    /// New session with a randomly chosen local role.
    pub fn new(config: NetplayConfig) -> Self {
        Self::with_state(config, AuthorityState::with_random_role())
    }

    /// New session where the local participant plays `role`.
    pub fn with_role(config: NetplayConfig, role: Player) -> Self {
        Self::with_state(config, AuthorityState::new(role))
    }

    fn with_state(config: NetplayConfig, state: AuthorityState) -> Self {
        let role = state.role();
        Self {
            core: PeerCore::new(create_url(&config.server_url), state, RoomCodeState::Pending),
            role,
        }
    }

    /// Local participant's side.
    pub fn role(&self) -> Player {
        self.role
    }

    /// Open the transport and start the session driver.
    pub async fn connect(&self) -> Result<(), NetplayError> {
        self.core.connect().await
    }

    /// Whether the session driver has exited.
    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }
}

/// Joins an existing room and mirrors the authority.
pub struct MirrorPeer {
    core: PeerCore<MirrorState>,
}

impl MirrorPeer {
    pub fn new(config: NetplayConfig, room_code: impl Into<String>) -> Self {
        let room_code = room_code.into();
        Self {
            core: PeerCore::new(
                join_url(&config.server_url, &room_code),
                MirrorState::new(),
                RoomCodeState::Assigned(room_code),
            ),
        }
    }

    /// Open the transport and start the session driver.
    pub async fn connect(&self) -> Result<(), NetplayError> {
        self.core.connect().await
    }

    /// Whether the session driver has exited.
    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }
}

macro_rules! impl_remote_game {
    ($peer:ty) => {
        impl RemoteGame for $peer {
            async fn room_code(&self) -> Result<String, NetplayError> {
                self.core.room_code().await
            }

            fn place_stone(&self, column: u8) {
                self.core.command(SessionCommand::PlaceStone(column));
            }

            fn resign(&self) {
                self.core.command(SessionCommand::Resign);
            }

            fn subscribe<F>(&self, handler: F) -> Subscription
            where
                F: Fn(&SessionEvent) + Send + Sync + 'static,
            {
                self.core.subscribe(handler)
            }

            fn destroy(&self) {
                self.core.command(SessionCommand::Destroy);
            }
        }
    };
}

impl_remote_game!(AuthoritativePeer);
impl_remote_game!(MirrorPeer);
