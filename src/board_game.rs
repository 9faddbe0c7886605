//! Shared types for the tic-tac-toe board, rules and agents.
use thiserror::Error;

use Player::{P1, P2};

/// Errors raised by the board, the rules engine and the search.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("cell {index} is out of range for a board of {cells} cells")]
    OutOfRange { index: usize, cells: usize },

    #[error("cell {0} is already taken")]
    IllegalMove(usize),

    #[error("no legal moves left to select or expand")]
    NoLegalMove,

    #[error("no more moves could be read from the player")]
    InputClosed,

    #[error("failed to read player input: {0}")]
    Input(String),

    #[error("a board of size {size} needs {expected} cells, got {actual}")]
    InvalidBoard {
        size: usize,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Did the game end in a draw or was there a winner?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndState {
    Winner(Player),
    Draw,
}

/// Has the game ended or is it ongoing?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Ended(EndState),
    Ongoing,
}

/// One of the two sides. P1 goes first.
///
/// Each player carries a signed unit value (P1 = +1, P2 = -1), so the opponent is the negation
/// and a line owned entirely by one player sums to `size * value`.
#[derive(Eq, Hash, Clone, Copy, Debug, PartialEq)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub fn get_opponent(self) -> Player {
        match self {
            P1 => P2,
            P2 => P1,
        }
    }

    pub fn value(self) -> i32 {
        match self {
            P1 => 1,
            P2 => -1,
        }
    }

    /// Board symbol used when printing.
    pub fn symbol(self) -> char {
        match self {
            P1 => 'O',
            P2 => 'X',
        }
    }
}

/// Represents a single cell of a game board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Full(Player),
}

impl Cell {
    /// Signed value of the cell. Empty is zero so it never contributes to a line sum.
    pub fn value(self) -> i32 {
        match self {
            Cell::Empty => 0,
            Cell::Full(player) => player.value(),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

#[test]
fn test_opponent_is_negation() {
    for player in [P1, P2] {
        assert_eq!(player.get_opponent().value(), -player.value());
        assert_eq!(player.get_opponent().get_opponent(), player);
    }
}

#[test]
fn test_empty_is_additive_identity() {
    assert_eq!(Cell::Empty.value(), 0);
    assert_eq!(Cell::Full(P1).value() + Cell::Empty.value(), 1);
    assert_eq!(Cell::Full(P2).value() + Cell::Empty.value(), -1);
    assert!(Cell::Empty.is_empty());
    assert!(!Cell::Full(P2).is_empty());
}
