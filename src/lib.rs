//! Tic-tac-toe on an N×N board with a Monte Carlo tree search opponent.
//!
//! The search sees every position from the side about to move, which is always encoded as
//! `Player::P1`. `Mcts::solve` takes the real board and returns a cell index. Use
//! `Board::flip_perspective` first when the AI plays second, or let `MctsAgent` do it.
pub mod agents;
pub mod arena;
pub mod board_game;
pub mod game;
pub mod rules;
pub mod session;
pub mod tictactoe;

pub use agents::{
    BoardGameAgent, HumanAgent, Mcts, MctsAgent, MctsConfig, RandomAgent, SearchResult,
};
pub use arena::{run_arena, ArenaConfig, ArenaReport};
pub use board_game::{Cell, EndState, GameError, GameState, Player, Result};
pub use game::Match;
pub use rules::Rules;
pub use session::{MatchSummary, Session};
pub use tictactoe::Board;
