//! Authoritative peer: owns the only [`Game`] and decides every move.

use dropfour_core::{Game, Player};
use dropfour_netproto::{
    CloseCode, HostMessage, Message, PeerMessage, RoomAssigned, decode_message,
};
use tracing::{debug, warn};

use crate::session::{Action, PeerProtocol, SessionEvent};

type Actions = Vec<Action<HostMessage>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityPhase {
    /// Connected, waiting for the relay to hand out the room code.
    AwaitingCode,
    /// Room exists; waiting for the mirror's hello and ready.
    AwaitingPeer,
    Active,
    Terminal,
}

pub struct AuthorityState {
    phase: AuthorityPhase,
    role: Player,
    role_sent: bool,
    game: Game,
}

impl AuthorityState {
    /// `role` is the local participant's side; the mirror plays the other one.
    pub fn new(role: Player) -> Self {
        Self {
            phase: AuthorityPhase::AwaitingCode,
            role,
            role_sent: false,
            game: Game::new(),
        }
    }

    /// Pick the local side uniformly at random.
    pub fn with_random_role() -> Self {
        let role = if rand::random::<bool>() {
            Player::First
        } else {
            Player::Second
        };
        Self::new(role)
    }

    pub fn role(&self) -> Player {
        self.role
    }

    pub fn phase(&self) -> AuthorityPhase {
        self.phase
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    fn mirror_role(&self) -> Player {
        self.role.other()
    }

    fn fail(&mut self) -> Actions {
        self.phase = AuthorityPhase::Terminal;
        vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
    }

    /// Place for whoever is active and report the result to both sides.
    fn apply(&mut self, column: u8) -> Actions {
        let mut actions = Vec::new();
        for event in self.game.place_stone(column) {
            actions.push(Action::Send(HostMessage::from(event)));
            actions.push(Action::Emit(SessionEvent::from(event)));
        }
        if self.game.is_over() {
            self.phase = AuthorityPhase::Terminal;
            actions.push(Action::Close);
        }
        actions
    }

    fn on_message(&mut self, msg: PeerMessage) -> Actions {
        match (self.phase, msg) {
            (AuthorityPhase::AwaitingPeer, PeerMessage::Hello) => {
                self.role_sent = true;
                vec![Action::Send(HostMessage::RoleAssignment {
                    player_turn: self.mirror_role(),
                })]
            }
            (AuthorityPhase::AwaitingPeer, PeerMessage::Ready) if self.role_sent => {
                self.phase = AuthorityPhase::Active;
                vec![Action::Emit(SessionEvent::Start {
                    my_turn: self.role,
                })]
            }
            (AuthorityPhase::Active, PeerMessage::PlaceStone { column }) => {
                if self.game.active_player() != self.mirror_role() {
                    debug!(column, "Ignoring out-of-turn placement from mirror");
                    return Vec::new();
                }
                self.apply(column)
            }
            (AuthorityPhase::AwaitingPeer | AuthorityPhase::Active, PeerMessage::Resign) => {
                self.phase = AuthorityPhase::Terminal;
                vec![Action::Emit(SessionEvent::OpponentResigned), Action::Close]
            }
            (phase, msg) => {
                debug!(?phase, kind = msg.kind(), "Ignoring message out of phase");
                Vec::new()
            }
        }
    }
}

impl PeerProtocol for AuthorityState {
    type Outgoing = HostMessage;

    fn on_open(&mut self) -> Actions {
        Vec::new()
    }

    fn on_text(&mut self, text: &str) -> Actions {
        if self.phase != AuthorityPhase::AwaitingCode {
            warn!("Unexpected text frame after room assignment");
            return self.fail();
        }
        match RoomAssigned::from_json(text) {
            Ok(assigned) => {
                self.phase = AuthorityPhase::AwaitingPeer;
                vec![Action::RoomCode(assigned.room_code)]
            }
            Err(e) => {
                warn!("Malformed room assignment: {}", e);
                self.fail()
            }
        }
    }

    fn on_frame(&mut self, frame: &[u8]) -> Actions {
        if self.phase == AuthorityPhase::Terminal {
            return Vec::new();
        }
        match decode_message::<PeerMessage>(frame) {
            Ok(msg) => self.on_message(msg),
            Err(e) => {
                warn!("Undecodable frame from mirror: {}", e);
                self.fail()
            }
        }
    }

    fn on_closed(&mut self, code: Option<u16>) -> Actions {
        if self.phase == AuthorityPhase::Terminal {
            return Vec::new();
        }
        self.phase = AuthorityPhase::Terminal;
        let event = match code.and_then(CloseCode::from_code) {
            Some(CloseCode::PlayerDisconnected) => SessionEvent::OpponentLeft,
            Some(CloseCode::CannotCreateRoom) => SessionEvent::RoomCreationFailed,
            _ => SessionEvent::SomethingWentWrong,
        };
        vec![Action::Emit(event)]
    }

    fn place_stone(&mut self, column: u8) -> Actions {
        if self.phase != AuthorityPhase::Active || self.game.active_player() != self.role {
            return Vec::new();
        }
        self.apply(column)
    }

    fn resign(&mut self) -> Actions {
        match self.phase {
            AuthorityPhase::Terminal => Vec::new(),
            AuthorityPhase::AwaitingCode => {
                self.phase = AuthorityPhase::Terminal;
                vec![Action::Close]
            }
            AuthorityPhase::AwaitingPeer | AuthorityPhase::Active => {
                self.phase = AuthorityPhase::Terminal;
                vec![Action::Send(HostMessage::Resign), Action::Close]
            }
        }
    }

    fn destroy(&mut self) -> Actions {
        if self.phase == AuthorityPhase::Terminal {
            return Vec::new();
        }
        self.phase = AuthorityPhase::Terminal;
        vec![Action::Close]
    }

    fn is_terminal(&self) -> bool {
        self.phase == AuthorityPhase::Terminal
    }
}

#[cfg(test)]
mod tests {
    use dropfour_netproto::encode_message;

    use super::*;

    fn frame(msg: PeerMessage) -> Vec<u8> {
        encode_message(&msg).unwrap()
    }

    fn assigned(role: Player) -> AuthorityState {
        let mut state = AuthorityState::new(role);
        assert!(state.on_open().is_empty());
        assert_eq!(
            state.on_text(r#"{"roomCode":"0815"}"#),
            vec![Action::RoomCode("0815".into())]
        );
        state
    }

    fn active(role: Player) -> AuthorityState {
        let mut state = assigned(role);
        state.on_frame(&frame(PeerMessage::Hello));
        state.on_frame(&frame(PeerMessage::Ready));
        assert_eq!(state.phase(), AuthorityPhase::Active);
        state
    }

    fn emitted(actions: &Actions) -> Vec<SessionEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Emit(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn handshake_assigns_the_other_role() {
        let mut state = assigned(Player::Second);
        assert_eq!(state.phase(), AuthorityPhase::AwaitingPeer);

        assert_eq!(
            state.on_frame(&frame(PeerMessage::Hello)),
            vec![Action::Send(HostMessage::RoleAssignment {
                player_turn: Player::First
            })]
        );
        assert_eq!(
            state.on_frame(&frame(PeerMessage::Ready)),
            vec![Action::Emit(SessionEvent::Start {
                my_turn: Player::Second
            })]
        );
        assert_eq!(state.phase(), AuthorityPhase::Active);
    }

    #[test]
    fn ready_without_hello_is_ignored() {
        let mut state = assigned(Player::First);
        assert!(state.on_frame(&frame(PeerMessage::Ready)).is_empty());
        assert_eq!(state.phase(), AuthorityPhase::AwaitingPeer);
    }

    #[test]
    fn resign_after_hello_ends_the_session_before_start() {
        let mut state = assigned(Player::First);
        state.on_frame(&frame(PeerMessage::Hello));
        assert_eq!(state.phase(), AuthorityPhase::AwaitingPeer);

        assert_eq!(
            state.on_frame(&frame(PeerMessage::Resign)),
            vec![Action::Emit(SessionEvent::OpponentResigned), Action::Close]
        );
        assert!(state.is_terminal());
        assert!(state.on_frame(&frame(PeerMessage::Ready)).is_empty());
    }

    #[test]
    fn moves_before_start_are_ignored() {
        let mut state = assigned(Player::First);
        assert!(state.place_stone(3).is_empty());
        assert!(
            state
                .on_frame(&frame(PeerMessage::PlaceStone { column: 3 }))
                .is_empty()
        );
        assert_eq!(state.game().free_cells(), dropfour_core::TOTAL_CELLS);
    }

    #[test]
    fn turn_ownership_is_enforced_on_both_sides() {
        // Local player is FIRST and opens.
        let mut state = active(Player::First);

        assert!(
            state
                .on_frame(&frame(PeerMessage::PlaceStone { column: 0 }))
                .is_empty()
        );

        let actions = state.place_stone(2);
        assert_eq!(
            actions,
            vec![
                Action::Send(HostMessage::NewStone {
                    player: Player::First,
                    column: 2,
                    row: 0
                }),
                Action::Emit(SessionEvent::NewStone {
                    player: Player::First,
                    column: 2,
                    row: 0
                }),
                Action::Send(HostMessage::PlayerSwitch {
                    next: Player::Second
                }),
                Action::Emit(SessionEvent::PlayerChange {
                    next: Player::Second
                }),
            ]
        );

        // Not our turn any more.
        assert!(state.place_stone(2).is_empty());

        let actions = state.on_frame(&frame(PeerMessage::PlaceStone { column: 2 }));
        assert_eq!(
            emitted(&actions)[0],
            SessionEvent::NewStone {
                player: Player::Second,
                column: 2,
                row: 1
            }
        );
        assert_eq!(state.game().active_player(), Player::First);
    }

    #[test]
    fn invalid_column_from_mirror_changes_nothing() {
        let mut state = active(Player::Second);
        assert!(
            state
                .on_frame(&frame(PeerMessage::PlaceStone { column: 7 }))
                .is_empty()
        );
        assert_eq!(state.game().active_player(), Player::First);
    }

    #[test]
    fn game_over_is_reported_and_closes() {
        let mut state = active(Player::First);
        let mut last = Vec::new();
        for _ in 0..3 {
            state.place_stone(0);
            state.on_frame(&frame(PeerMessage::PlaceStone { column: 6 }));
        }
        last.extend(state.place_stone(0));

        assert_eq!(
            emitted(&last),
            vec![
                SessionEvent::NewStone {
                    player: Player::First,
                    column: 0,
                    row: 3
                },
                SessionEvent::GameOver {
                    winner: Some(Player::First)
                },
            ]
        );
        assert!(last.contains(&Action::Send(HostMessage::GameOver {
            winner: Some(Player::First)
        })));
        assert_eq!(last.last(), Some(&Action::Close));
        assert!(state.is_terminal());

        assert!(
            state
                .on_frame(&frame(PeerMessage::PlaceStone { column: 6 }))
                .is_empty()
        );
        assert!(state.on_closed(Some(4002)).is_empty());
    }

    #[test]
    fn mirror_resignation() {
        let mut state = active(Player::First);
        assert_eq!(
            state.on_frame(&frame(PeerMessage::Resign)),
            vec![Action::Emit(SessionEvent::OpponentResigned), Action::Close]
        );
        assert!(state.place_stone(0).is_empty());
        assert!(state.on_frame(&frame(PeerMessage::Resign)).is_empty());
    }

    #[test]
    fn local_resignation_is_silent_locally() {
        let mut state = active(Player::Second);
        assert_eq!(
            state.resign(),
            vec![Action::Send(HostMessage::Resign), Action::Close]
        );
        assert!(state.resign().is_empty());
        assert!(state.on_closed(Some(4002)).is_empty());
    }

    #[test]
    fn close_codes_map_to_events() {
        let mut state = active(Player::First);
        assert_eq!(
            state.on_closed(Some(CloseCode::PlayerDisconnected.code())),
            vec![Action::Emit(SessionEvent::OpponentLeft)]
        );

        let mut state = AuthorityState::new(Player::First);
        assert_eq!(
            state.on_closed(Some(CloseCode::CannotCreateRoom.code())),
            vec![Action::Emit(SessionEvent::RoomCreationFailed)]
        );

        let mut state = assigned(Player::First);
        assert_eq!(
            state.on_closed(None),
            vec![Action::Emit(SessionEvent::SomethingWentWrong)]
        );
    }

    #[test]
    fn garbage_breaks_the_session() {
        let mut state = active(Player::First);
        assert_eq!(
            state.on_frame(&[0xff, 0xff]),
            vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
        );
        assert!(state.is_terminal());

        let mut state = AuthorityState::new(Player::First);
        assert_eq!(
            state.on_text("{}"),
            vec![Action::Emit(SessionEvent::SomethingWentWrong), Action::Close]
        );
    }

    #[test]
    fn destroy_closes_without_event() {
        let mut state = active(Player::First);
        assert_eq!(state.destroy(), vec![Action::Close]);
        assert!(state.on_closed(Some(4002)).is_empty());
    }
}
