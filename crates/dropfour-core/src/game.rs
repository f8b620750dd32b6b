//! Turn and outcome state machine.

use serde::{Deserialize, Serialize};

use crate::board::{Board, TOTAL_CELLS};
use crate::listeners::{Listeners, Subscription};
use crate::player::Player;

/// Observable change produced by [`Game::place_stone`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    NewStone { player: Player, column: u8, row: u8 },
    PlayerChange { next: Player },
    /// `winner` is `None` for a draw.
    GameOver { winner: Option<Player> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Player),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::Win(player) => Some(player),
            Outcome::Draw => None,
        }
    }
}

/// A single game. `First` opens.
pub struct Game {
    board: Board,
    active_player: Player,
    free_cells: usize,
    outcome: Option<Outcome>,
    listeners: Listeners<GameEvent>,
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            active_player: Player::First,
            free_cells: TOTAL_CELLS,
            outcome: None,
            listeners: Listeners::new(),
        }
    }

    /// Drop a stone for the active player.
    ///
    /// Ignored once the game is over, for an out-of-range column, or for a full
    /// column. Turn ownership is the caller's concern. Returns the produced events
    /// in order after delivering them to listeners; the new stone always comes
    /// first, followed by either a player change or the game over.
    pub fn place_stone(&mut self, column: u8) -> Vec<GameEvent> {
        if self.outcome.is_some() {
            return Vec::new();
        }

        let player = self.active_player;
        let Some(row) = self.board.drop_stone(column, player) else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(2);
        events.push(GameEvent::NewStone {
            player,
            column,
            row,
        });

        let won = self.board.completes_line(column, row);
        self.free_cells -= 1;

        if won {
            self.outcome = Some(Outcome::Win(player));
            events.push(GameEvent::GameOver {
                winner: Some(player),
            });
        } else if self.free_cells == 0 {
            self.outcome = Some(Outcome::Draw);
            events.push(GameEvent::GameOver { winner: None });
        } else {
            self.active_player = player.other();
            events.push(GameEvent::PlayerChange {
                next: self.active_player,
            });
        }

        for event in &events {
            self.listeners.emit(event);
        }
        events
    }

    /// Player whose turn it is. Meaningless once the game is over.
    pub fn active_player(&self) -> Player {
        self.active_player
    }

    pub fn free_cells(&self) -> usize {
        self.free_cells
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(handler)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
