//! Mirror peer: reflects what the authority reports and never decides anything.

use dropfour_core::Player;
use dropfour_netproto::{CloseCode, HostMessage, Message, PeerMessage, decode_message};
use tracing::warn;

use crate::session::{Action, PeerProtocol, SessionEvent};

type Actions = Vec<Action<PeerMessage>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPhase {
    Connecting,
    /// Hello sent, waiting for the authority's role assignment.
    AwaitingRole,
    Active,
    Terminal,
}

#[derive(Debug)]
pub struct MirrorState {
    phase: MirrorPhase,
    role: Option<Player>,
}

impl MirrorState {
    pub fn new() -> Self {
        Self {
            phase: MirrorPhase::Connecting,
            role: None,
        }
    }

    pub fn phase(&self) -> MirrorPhase {
        self.phase
    }

    /// Role assigned by the authority, once known.
    pub fn role(&self) -> Option<Player> {
        self.role
    }

    fn fail(&mut self) -> Actions {
        self.phase = MirrorPhase::Terminal;
        vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
    }

    fn end_with(&mut self, event: SessionEvent) -> Actions {
        self.phase = MirrorPhase::Terminal;
        vec![Action::Emit(event), Action::Close]
    }

    fn on_message(&mut self, msg: HostMessage) -> Actions {
        match (self.phase, msg) {
            (MirrorPhase::AwaitingRole, HostMessage::RoleAssignment { player_turn }) => {
                self.role = Some(player_turn);
                self.phase = MirrorPhase::Active;
                vec![
                    Action::Send(PeerMessage::Ready),
                    Action::Emit(SessionEvent::Start {
                        my_turn: player_turn,
                    }),
                ]
            }
            (
                MirrorPhase::Active,
                HostMessage::NewStone {
                    player,
                    column,
                    row,
                },
            ) => vec![Action::Emit(SessionEvent::NewStone {
                player,
                column,
                row,
            })],
            (MirrorPhase::Active, HostMessage::PlayerSwitch { next }) => {
                vec![Action::Emit(SessionEvent::PlayerChange { next })]
            }
            (MirrorPhase::Active, HostMessage::GameOver { winner }) => {
                self.end_with(SessionEvent::GameOver { winner })
            }
            (MirrorPhase::AwaitingRole | MirrorPhase::Active, HostMessage::Resign) => {
                self.end_with(SessionEvent::OpponentResigned)
            }
            (phase, msg) => {
                warn!(?phase, kind = msg.kind(), "Unexpected message from authority");
                self.fail()
            }
        }
    }
}

impl Default for MirrorState {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerProtocol for MirrorState {
    type Outgoing = PeerMessage;

    fn on_open(&mut self) -> Actions {
        if self.phase != MirrorPhase::Connecting {
            return Vec::new();
        }
        self.phase = MirrorPhase::AwaitingRole;
        vec![Action::Send(PeerMessage::Hello)]
    }

    fn on_text(&mut self, _text: &str) -> Actions {
        if self.phase == MirrorPhase::Terminal {
            return Vec::new();
        }
        // The relay never talks to a joining connection.
        warn!("Unexpected text frame from relay");
        self.fail()
    }

    fn on_frame(&mut self, frame: &[u8]) -> Actions {
        if self.phase == MirrorPhase::Terminal {
            return Vec::new();
        }
        match decode_message::<HostMessage>(frame) {
            Ok(msg) => self.on_message(msg),
            Err(e) => {
                warn!("Undecodable frame from authority: {}", e);
                self.fail()
            }
        }
    }

    fn on_closed(&mut self, code: Option<u16>) -> Actions {
        if self.phase == MirrorPhase::Terminal {
            return Vec::new();
        }
        self.phase = MirrorPhase::Terminal;
        let event = match code.and_then(CloseCode::from_code) {
            Some(CloseCode::HostDisconnected) => SessionEvent::OpponentLeft,
            Some(CloseCode::NoRoom) => SessionEvent::RoomNotFound,
            _ => SessionEvent::SomethingWentWrong,
        };
        vec![Action::Emit(event)]
    }

    fn place_stone(&mut self, column: u8) -> Actions {
        if self.phase == MirrorPhase::Terminal {
            return Vec::new();
        }
        vec![Action::Send(PeerMessage::PlaceStone { column })]
    }

    fn resign(&mut self) -> Actions {
        if self.phase == MirrorPhase::Terminal {
            return Vec::new();
        }
        self.phase = MirrorPhase::Terminal;
        vec![Action::Send(PeerMessage::Resign), Action::Close]
    }

    fn destroy(&mut self) -> Actions {
        if self.phase == MirrorPhase::Terminal {
            return Vec::new();
        }
        self.phase = MirrorPhase::Terminal;
        vec![Action::Close]
    }

    fn is_terminal(&self) -> bool {
        self.phase == MirrorPhase::Terminal
    }
}

#[cfg(test)]
mod tests {
    use dropfour_netproto::encode_message;

    use super::*;

    fn frame(msg: HostMessage) -> Vec<u8> {
        encode_message(&msg).unwrap()
    }

    fn active(role: Player) -> MirrorState {
        let mut state = MirrorState::new();
        assert_eq!(state.on_open(), vec![Action::Send(PeerMessage::Hello)]);
        assert_eq!(
            state.on_frame(&frame(HostMessage::RoleAssignment { player_turn: role })),
            vec![
                Action::Send(PeerMessage::Ready),
                Action::Emit(SessionEvent::Start { my_turn: role }),
            ]
        );
        state
    }

    #[test]
    fn role_assignment_starts_the_game() {
        let state = active(Player::First);
        assert_eq!(state.phase(), MirrorPhase::Active);
        assert_eq!(state.role(), Some(Player::First));
    }

    #[test]
    fn reported_events_are_reflected_one_to_one() {
        let mut state = active(Player::Second);
        assert_eq!(
            state.on_frame(&frame(HostMessage::NewStone {
                player: Player::First,
                column: 4,
                row: 0
            })),
            vec![Action::Emit(SessionEvent::NewStone {
                player: Player::First,
                column: 4,
                row: 0
            })]
        );
        assert_eq!(
            state.on_frame(&frame(HostMessage::PlayerSwitch {
                next: Player::Second
            })),
            vec![Action::Emit(SessionEvent::PlayerChange {
                next: Player::Second
            })]
        );
    }

    #[test]
    fn game_over_and_resign_are_terminal() {
        let mut state = active(Player::Second);
        assert_eq!(
            state.on_frame(&frame(HostMessage::GameOver { winner: None })),
            vec![
                Action::Emit(SessionEvent::GameOver { winner: None }),
                Action::Close
            ]
        );
        assert!(state.place_stone(0).is_empty());
        assert!(state.on_closed(Some(4001)).is_empty());

        let mut state = active(Player::First);
        assert_eq!(
            state.on_frame(&frame(HostMessage::Resign)),
            vec![Action::Emit(SessionEvent::OpponentResigned), Action::Close]
        );
        assert!(state.on_frame(&frame(HostMessage::Resign)).is_empty());
    }

    #[test]
    fn placements_are_forwarded_unvalidated() {
        let mut state = active(Player::First);
        assert_eq!(
            state.place_stone(42),
            vec![Action::Send(PeerMessage::PlaceStone { column: 42 })]
        );
    }

    #[test]
    fn out_of_phase_message_breaks_the_session() {
        let mut state = MirrorState::new();
        state.on_open();
        assert_eq!(
            state.on_frame(&frame(HostMessage::PlayerSwitch {
                next: Player::First
            })),
            vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
        );

        let mut state = active(Player::First);
        assert_eq!(
            state.on_frame(&frame(HostMessage::RoleAssignment {
                player_turn: Player::Second
            })),
            vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
        );

        let mut state = active(Player::First);
        assert_eq!(
            state.on_text(r#"{"roomCode":"1234"}"#),
            vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
        );

        let mut state = active(Player::First);
        assert_eq!(
            state.on_frame(&[]),
            vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
        );
    }

    #[test]
    fn close_codes_map_to_events() {
        let mut state = active(Player::First);
        assert_eq!(
            state.on_closed(Some(CloseCode::HostDisconnected.code())),
            vec![Action::Emit(SessionEvent::OpponentLeft)]
        );

        let mut state = MirrorState::new();
        state.on_open();
        assert_eq!(
            state.on_closed(Some(CloseCode::NoRoom.code())),
            vec![Action::Emit(SessionEvent::RoomNotFound)]
        );

        let mut state = active(Player::First);
        assert_eq!(
            state.on_closed(Some(1000)),
            vec![Action::Emit(SessionEvent::SomethingWentWrong)]
        );
    }

    #[test]
    fn local_resign_and_destroy() {
        let mut state = active(Player::First);
        assert_eq!(
            state.resign(),
            vec![Action::Send(PeerMessage::Resign), Action::Close]
        );
        assert!(state.resign().is_empty());

        let mut state = active(Player::First);
        assert_eq!(state.destroy(), vec![Action::Close]);
        assert!(state.on_closed(Some(4001)).is_empty());
    }
}
