//! Board rebuilt from received events.
//!
//! The mirror side and presentation layers keep one of these instead of a
//! [`Game`](crate::Game): it trusts the reported coordinates and never decides
//! outcomes.

use crate::board::{COLUMNS, ROWS};
use crate::game::GameEvent;
use crate::player::Player;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    cells: [[Option<Player>; ROWS]; COLUMNS],
    active_player: Option<Player>,
    finished: Option<Option<Player>>,
}

impl BoardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event. Stones with out-of-range coordinates are dropped.
    pub fn apply(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::NewStone {
                player,
                column,
                row,
            } => {
                if let Some(cell) = self
                    .cells
                    .get_mut(column as usize)
                    .and_then(|c| c.get_mut(row as usize))
                {
                    *cell = Some(player);
                }
            }
            GameEvent::PlayerChange { next } => self.active_player = Some(next),
            GameEvent::GameOver { winner } => self.finished = Some(winner),
        }
    }

    pub fn get(&self, column: u8, row: u8) -> Option<Player> {
        self.cells
            .get(column as usize)
            .and_then(|c| c.get(row as usize))
            .copied()
            .flatten()
    }

    /// Last reported active player, if any switch has been seen.
    pub fn active_player(&self) -> Option<Player> {
        self.active_player
    }

    /// `Some(winner)` once a game-over was applied; the inner `None` is a draw.
    pub fn result(&self) -> Option<Option<Player>> {
        self.finished
    }
}
