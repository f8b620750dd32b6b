//! Gravity grid storage and line detection.

use crate::player::Player;

pub const COLUMNS: usize = 7;
pub const ROWS: usize = 6;
pub const TOTAL_CELLS: usize = COLUMNS * ROWS;

/// Stones needed in a line to win.
pub const LINE_LEN: usize = 4;

/// Direction vectors as (column, row) steps. Each axis is checked in both
/// directions, so the negated vectors are not listed.
const AXES: [(i8, i8); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Seven columns, each stacked bottom to top.
///
/// Row 0 is the bottom of a column. A stone never moves once placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    columns: [Vec<Player>; COLUMNS],
}

impl Board {
    /// Create a new empty board.
    pub fn new() -> Self {
        Self {
            columns: std::array::from_fn(|_| Vec::with_capacity(ROWS)),
        }
    }

    /// Stone at (column, row), or `None` for an empty or out-of-range cell.
    pub fn get(&self, column: u8, row: u8) -> Option<Player> {
        self.columns
            .get(column as usize)?
            .get(row as usize)
            .copied()
    }

    /// Stones in `column`, bottom first. Empty for an out-of-range column.
    pub fn column(&self, column: u8) -> &[Player] {
        self.columns
            .get(column as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of stones in a column.
    pub fn height(&self, column: u8) -> usize {
        self.column(column).len()
    }

    pub fn is_column_full(&self, column: u8) -> bool {
        self.columns
            .get(column as usize)
            .is_none_or(|c| c.len() >= ROWS)
    }

    /// Stack a stone on `column`, returning the row it landed on.
    ///
    /// Returns `None` without touching the board if the column is out of range or full.
    pub fn drop_stone(&mut self, column: u8, player: Player) -> Option<u8> {
        let stack = self.columns.get_mut(column as usize)?;
        if stack.len() >= ROWS {
            return None;
        }
        stack.push(player);
        Some((stack.len() - 1) as u8)
    }

    /// Check whether the stone at (column, row) is part of a line of four.
    ///
    /// Only runs through the anchor are examined, so this must be called for the
    /// stone that was just placed.
    pub fn completes_line(&self, column: u8, row: u8) -> bool {
        let Some(owner) = self.get(column, row) else {
            return false;
        };

        AXES.iter().any(|&(dc, dr)| {
            let forward = self.run_from(column, row, dc, dr, owner);
            let backward = self.run_from(column, row, -dc, -dr, owner);
            1 + forward + backward >= LINE_LEN
        })
    }

    /// Count consecutive `owner` stones from the anchor (exclusive) along one direction.
    fn run_from(&self, column: u8, row: u8, dc: i8, dr: i8, owner: Player) -> usize {
        (1..LINE_LEN as i8)
            .take_while(|&step| {
                let c = column as i8 + dc * step;
                let r = row as i8 + dr * step;
                self.cell(c, r) == Some(owner)
            })
            .count()
    }

    fn cell(&self, column: i8, row: i8) -> Option<Player> {
        if column < 0 || row < 0 {
            return None;
        }
        self.get(column as u8, row as u8)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
