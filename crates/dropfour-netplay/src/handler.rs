//! Async driver shared by both peer roles.

use std::sync::Arc;

use bytes::Bytes;
use dropfour_core::Listeners;
use dropfour_netproto::{Message, encode_message};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::session::{Action, PeerProtocol, RoomCodeState, SessionEvent};
use crate::ws_client::{WsClientEvent, WsClientHandle};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetplayConfig {
    /// Relay base URL, e.g. `ws://127.0.0.1:8080`.
    pub server_url: String,
}

impl NetplayConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }
}

impl Default for NetplayConfig {
    fn default() -> Self {
        Self::new("ws://127.0.0.1:8080")
    }
}

/// User requests forwarded to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    PlaceStone(u8),
    Resign,
    Destroy,
}

/// Runs one session: feeds transport events and user commands into the
/// protocol state machine and performs the actions it returns.
pub struct SessionHandler<P: PeerProtocol> {
    state: P,
    transport: WsClientHandle,
    event_rx: mpsc::Receiver<WsClientEvent>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    listeners: Listeners<SessionEvent>,
    room_code: Arc<watch::Sender<RoomCodeState>>,
}

impl<P: PeerProtocol> SessionHandler<P> {
    pub fn new(
        state: P,
        transport: WsClientHandle,
        event_rx: mpsc::Receiver<WsClientEvent>,
        command_rx: mpsc::UnboundedReceiver<SessionCommand>,
        listeners: Listeners<SessionEvent>,
        room_code: Arc<watch::Sender<RoomCodeState>>,
    ) -> Self {
        Self {
            state,
            transport,
            event_rx,
            command_rx,
            listeners,
            room_code,
        }
    }

    /// Drive the session until the transport is gone.
    pub async fn run(mut self) {
        let mut commands_open = true;

        loop {
            // A finished session has nothing left to do with user input.
            let accepting = commands_open && !self.state.is_terminal();

            // Transport events first so a move never overtakes the message that
            // made it legal.
            let actions = tokio::select! {
                biased;

                event = self.event_rx.recv() => {
                    match event {
                        Some(WsClientEvent::Connected) => self.state.on_open(),
                        Some(WsClientEvent::Text(text)) => self.state.on_text(&text),
                        Some(WsClientEvent::Frame(frame)) => self.state.on_frame(&frame),
                        Some(WsClientEvent::Closed { code, reason }) => {
                            info!(?code, %reason, "Transport closed");
                            let actions = self.state.on_closed(code);
                            self.perform(actions).await;
                            break;
                        }
                        None => {
                            debug!("Event channel closed");
                            let actions = self.state.on_closed(None);
                            self.perform(actions).await;
                            break;
                        }
                    }
                }
                cmd = self.command_rx.recv(), if accepting => {
                    match cmd {
                        Some(SessionCommand::PlaceStone(column)) => self.state.place_stone(column),
                        Some(SessionCommand::Resign) => self.state.resign(),
                        Some(SessionCommand::Destroy) => self.state.destroy(),
                        None => {
                            // Owner dropped: nobody is listening any more.
                            commands_open = false;
                            self.state.destroy()
                        }
                    }
                }
            };

            self.perform(actions).await;
        }

        // A session that ended before the relay assigned a code never gets one.
        self.room_code.send_if_modified(|state| {
            if *state == RoomCodeState::Pending {
                *state = RoomCodeState::Failed;
                true
            } else {
                false
            }
        });
    }

    async fn perform(&mut self, actions: Vec<Action<P::Outgoing>>) {
        for action in actions {
            match action {
                Action::Send(msg) => {
                    trace!(kind = msg.kind(), "Sending message");
                    match encode_message(&msg) {
                        Ok(bytes) => {
                            if let Err(e) = self.transport.send(Bytes::from(bytes)).await {
                                debug!("Send after transport shutdown: {}", e);
                            }
                        }
                        Err(e) => warn!(kind = msg.kind(), "Failed to encode message: {}", e),
                    }
                }
                Action::Emit(event) => {
                    debug!(?event, "Session event");
                    self.listeners.emit(&event);
                }
                Action::RoomCode(code) => {
                    info!(room_code = %code, "Room code assigned");
                    self.room_code.send_replace(RoomCodeState::Assigned(code));
                }
                Action::Close => self.transport.close().await,
            }
        }
    }
}
