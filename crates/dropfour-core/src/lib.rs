//! Board engine for the dropfour game.
//!
//! Everything in this crate is synchronous and free of I/O. The authoritative
//! peer owns a [`Game`]; everyone else only ever sees the events it produces.
//!
//! # Architecture
//!
//! - [`player`]: the two participants
//! - [`board`]: 7x6 gravity grid and anchor-based line detection
//! - [`game`]: turn/outcome state machine producing [`GameEvent`]s
//! - [`listeners`]: reentrant-safe listener registry shared with the netplay layer
//! - [`view`]: board re-derived from received events (no rules)

pub mod board;
pub mod game;
pub mod listeners;
pub mod player;
pub mod view;

pub use board::{Board, COLUMNS, ROWS, TOTAL_CELLS};
pub use game::{Game, GameEvent, Outcome};
pub use listeners::{Listeners, Subscription};
pub use player::Player;
pub use view::BoardView;
