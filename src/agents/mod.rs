//! Agents that pick moves on a tic-tac-toe board.
mod mcts_agent;
pub mod search_tree;

pub use mcts_agent::{
    Mcts, MctsAgent, MctsConfig, SearchResult, DEFAULT_EXPLORATION_CONSTANT, DEFAULT_ITERATIONS,
};

use std::io::{self, BufRead, ErrorKind, StdinLock};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board_game::{GameError, Player, Result};
use crate::rules::Rules;
use crate::tictactoe::Board;

const BAD_INPUT: &str = "bad input";
const CELL_TAKEN: &str = "cell taken";
const NOT_UTF8: &str = "input was not valid UTF-8";

/// An agent that will choose a valid move given the state of the game board.
pub trait BoardGameAgent {
    /// Pick a cell index for `player` to occupy next.
    fn choose_move(&mut self, board: &Board, player: Player) -> Result<usize>;
}

/*
 * -----------
 * Human Agent
 * -----------
 */

/// An agent controlled by the user running the program. Moves are typed as the 1-based cell
/// number shown on the board.
pub struct HumanAgent<I: BufRead> {
    input: I,
}

impl HumanAgent<StdinLock<'static>> {
    pub fn stdin() -> Self {
        HumanAgent::new(io::stdin().lock())
    }
}

impl<I: BufRead> HumanAgent<I> {
    pub fn new(input: I) -> Self {
        HumanAgent { input }
    }

    /// Read one line. Returns None for a line that could not be decoded, so the caller can
    /// prompt again.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Err(GameError::InputClosed),
            Ok(_) => Ok(Some(line)),
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                println!("Oops, {}", NOT_UTF8);
                Ok(None)
            }
            Err(err) => Err(GameError::Input(err.to_string())),
        }
    }

    /// Ask whether to start another match: `n` for yes, `q` for no.
    pub fn ask_next_match(&mut self) -> Result<bool> {
        loop {
            println!("[N]ext match -- [Q]uit");
            let line = match self.read_line()? {
                Some(line) => line,
                None => continue,
            };
            match line.trim() {
                "n" | "N" => return Ok(true),
                "q" | "Q" => return Ok(false),
                _ => println!("Oops, {}", BAD_INPUT),
            }
        }
    }

    /// Translate a typed line into a cell index that is free on `board`.
    fn parse_move(line: &str, board: &Board) -> std::result::Result<usize, &'static str> {
        let number: usize = line.trim().parse().map_err(|_| BAD_INPUT)?;
        if number == 0 || number > board.num_cells() {
            return Err(BAD_INPUT);
        }
        let index = number - 1;
        match board.get(index) {
            Ok(cell) if cell.is_empty() => Ok(index),
            Ok(_) => Err(CELL_TAKEN),
            Err(_) => Err(BAD_INPUT),
        }
    }
}

impl<I: BufRead> BoardGameAgent for HumanAgent<I> {
    fn choose_move(&mut self, board: &Board, player: Player) -> Result<usize> {
        loop {
            println!(
                "{} to move, enter a cell (1-{}):",
                player.symbol(),
                board.num_cells()
            );
            let line = match self.read_line()? {
                Some(line) => line,
                None => continue,
            };
            match Self::parse_move(&line, board) {
                Ok(index) => return Ok(index),
                Err(msg) => println!("Oops, {}", msg),
            }
        }
    }
}

/*
 * ------------
 * Random Agent
 * ------------
 */

#[derive(Clone, Debug)]
/// Agent that makes uniformly random legal moves.
pub struct RandomAgent<R: Rng> {
    rules: Rules,
    rng: R,
}

impl<R: Rng> RandomAgent<R> {
    pub fn new(rng: R) -> RandomAgent<R> {
        RandomAgent {
            rules: Rules::new(),
            rng,
        }
    }
}

impl<R: Rng> BoardGameAgent for RandomAgent<R> {
    fn choose_move(&mut self, board: &Board, _player: Player) -> Result<usize> {
        self.rules
            .legal_moves(board)
            .choose(&mut self.rng)
            .copied()
            .ok_or(GameError::NoLegalMove)
    }
}

#[test]
fn test_human_agent_reprompts_until_valid() {
    use crate::board_game::Player::{P1, P2};

    let mut board = Board::new(3);
    board.set(4, P1).unwrap();
    let input = io::Cursor::new("abc\n0\n10\n5\n6\n");
    let mut agent = HumanAgent::new(input);
    assert_eq!(Ok(5), agent.choose_move(&board, P2));
}

#[test]
fn test_human_agent_input_closed() {
    use crate::board_game::Player::P1;

    let board = Board::new(3);
    let mut agent = HumanAgent::new(io::Cursor::new("x\n"));
    assert_eq!(Err(GameError::InputClosed), agent.choose_move(&board, P1));
}

#[test]
fn test_human_agent_reprompts_after_invalid_utf8() {
    use crate::board_game::Player::P1;

    let board = Board::new(3);
    let input = io::Cursor::new(b"\xff\xfe\n7\n".to_vec());
    let mut agent = HumanAgent::new(input);
    assert_eq!(Ok(6), agent.choose_move(&board, P1));
}

#[test]
fn test_ask_next_match() {
    let mut agent = HumanAgent::new(io::Cursor::new(b"maybe\n\xff\nN\nq\n".to_vec()));
    assert_eq!(Ok(true), agent.ask_next_match());
    assert_eq!(Ok(false), agent.ask_next_match());
    assert_eq!(Err(GameError::InputClosed), agent.ask_next_match());
}

#[test]
fn test_random_agent_picks_legal_moves() {
    use crate::board_game::Player::{P1, P2};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    let mut board = Board::new(3);
    for (i, p) in [(0, P1), (1, P2), (2, P1), (4, P2)] {
        board.set(i, p).unwrap();
    }
    let mut agent = RandomAgent::new(ChaCha8Rng::seed_from_u64(1));
    for _ in 0..50 {
        let move_ = agent.choose_move(&board, P1).unwrap();
        assert!([3, 5, 6, 7, 8].contains(&move_));
    }

    let mut full = Board::new(1);
    full.set(0, P1).unwrap();
    assert_eq!(Err(GameError::NoLegalMove), agent.choose_move(&full, P2));
}
