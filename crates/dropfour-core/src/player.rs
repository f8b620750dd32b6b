use serde::{Deserialize, Serialize};

/// One of the two participants of a game.
///
/// `First` always makes the opening placement.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Get the other player.
    pub fn other(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_player_flips() {
        assert_eq!(Player::First.other(), Player::Second);
        assert_eq!(Player::Second.other(), Player::First);
        assert_eq!(Player::First.other().other(), Player::First);
    }
}
