//! Rules of N-in-a-row tic-tac-toe, evaluated over a `Board`.
use crate::board_game::Cell::Full;
use crate::board_game::EndState::{Draw, Winner};
use crate::board_game::GameState::{Ended, Ongoing};
use crate::board_game::Player::P1;
use crate::board_game::{GameState, Player, Result};
use crate::tictactoe::Board;

/// Stateless rule evaluator. Holds no data, so it is freely copied into the search and the
/// match loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rules;

impl Rules {
    pub fn new() -> Rules {
        Rules
    }

    /// Every empty cell index, ascending.
    pub fn legal_moves(&self, board: &Board) -> Vec<usize> {
        board
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn opponent(&self, player: Player) -> Player {
        player.get_opponent()
    }

    /// Occupy `index` for `player`. The board is left untouched if the cell is taken.
    pub fn play_move(&self, board: &mut Board, index: usize, player: Player) -> Result<()> {
        board.set(index, player)
    }

    /// Did the last move, played at `last_move`, complete a line for whoever holds that cell?
    pub fn check_win(&self, board: &Board, last_move: Option<usize>) -> Result<bool> {
        let index = match last_move {
            Some(index) => index,
            None => return Ok(false),
        };
        let player = match board.get(index)? {
            Full(player) => player,
            _ => return Ok(false),
        };
        let (row, col) = board.row_col(index)?;
        let size = board.size();

        // check row
        if self.line_is_owned(board, player, (0..size).map(|i| row * size + i)) {
            return Ok(true);
        }

        // check col
        if self.line_is_owned(board, player, (0..size).map(|i| i * size + col)) {
            return Ok(true);
        }

        // check \ diag
        if row == col && self.line_is_owned(board, player, (0..size).map(|i| i * size + i)) {
            return Ok(true);
        }

        // check / diag
        if row + col == size - 1
            && self.line_is_owned(board, player, (0..size).map(|i| i * size + size - 1 - i))
        {
            return Ok(true);
        }

        Ok(false)
    }

    /// Report whether the game ended with `last_move`.
    ///
    /// A win is always reported as `Winner(P1)`: inside the search the side that just moved is
    /// the canonical player, and callers outside it map the winner back to the real mover.
    /// With no prior move the game is never over.
    pub fn is_game_over(&self, board: &Board, last_move: Option<usize>) -> Result<GameState> {
        if last_move.is_none() {
            return Ok(Ongoing);
        }

        if self.check_win(board, last_move)? {
            return Ok(Ended(Winner(P1)));
        }

        if self.legal_moves(board).is_empty() {
            return Ok(Ended(Draw));
        }

        Ok(Ongoing)
    }

    /// Sum the signed cell values along a line. Only a line filled entirely by `player` reaches
    /// `size * player.value()`.
    fn line_is_owned(
        &self,
        board: &Board,
        player: Player,
        line: impl Iterator<Item = usize>,
    ) -> bool {
        let sum: i32 = line.map(|i| board.cells()[i].value()).sum();
        sum == board.size() as i32 * player.value()
    }
}

#[cfg(test)]
fn board_from(size: usize, cells: &[i32]) -> Board {
    use crate::board_game::Cell::Empty;
    use crate::board_game::Player::P2;

    let cells = cells
        .iter()
        .map(|&v| match v {
            1 => Full(P1),
            -1 => Full(P2),
            _ => Empty,
        })
        .collect();
    Board::from_cells(size, cells).unwrap()
}

#[test]
fn test_legal_moves_ascending_and_empty_only() {
    let rules = Rules::new();
    let board = board_from(3, &[1, 0, -1, 0, 1, 0, 0, 0, -1]);
    assert_eq!(vec![1, 3, 5, 6, 7], rules.legal_moves(&board));
    assert_eq!(9, rules.legal_moves(&Board::new(3)).len());
}

#[test]
fn test_check_win_row() {
    let rules = Rules::new();
    let board = board_from(3, &[1, 1, 1, -1, -1, 0, 0, 0, 0]);
    assert_eq!(Ok(true), rules.check_win(&board, Some(2)));
    assert_eq!(Ok(Ended(Winner(P1))), rules.is_game_over(&board, Some(2)));
}

#[test]
fn test_check_win_incomplete_row() {
    let rules = Rules::new();
    let board = board_from(3, &[1, 1, 0, 0, -1, 0, 0, 0, 0]);
    assert_eq!(Ok(false), rules.check_win(&board, Some(1)));
    assert_eq!(Ok(Ongoing), rules.is_game_over(&board, Some(1)));
}

#[test]
fn test_check_win_col_and_diagonals() {
    let rules = Rules::new();

    let board = board_from(3, &[0, -1, 1, 0, -1, 1, 0, -1, 0]);
    assert_eq!(Ok(true), rules.check_win(&board, Some(7)));

    let board = board_from(3, &[-1, 1, 0, 1, -1, 0, 0, 1, -1]);
    assert_eq!(Ok(true), rules.check_win(&board, Some(8)));

    let board = board_from(3, &[-1, -1, 1, 0, 1, 0, 1, -1, 0]);
    assert_eq!(Ok(true), rules.check_win(&board, Some(6)));
}

#[test]
fn test_check_win_ignores_diagonal_off_diagonal_move() {
    let rules = Rules::new();
    // \ diagonal is full of P1 but the last move (index 1) is not on it
    let board = board_from(3, &[1, 1, -1, -1, 1, 0, 0, -1, 1]);
    assert_eq!(Ok(false), rules.check_win(&board, Some(1)));
    assert_eq!(Ok(true), rules.check_win(&board, Some(4)));
}

#[test]
fn test_check_win_sentinel_and_empty_cell() {
    let rules = Rules::new();
    let board = board_from(3, &[1, 1, 1, 0, 0, 0, 0, 0, 0]);
    assert_eq!(Ok(false), rules.check_win(&board, None));
    assert_eq!(Ok(false), rules.check_win(&board, Some(4)));
    assert_eq!(Ok(Ongoing), rules.is_game_over(&board, None));
    assert!(rules.check_win(&board, Some(9)).is_err());
}

#[test]
fn test_full_board_draw() {
    let rules = Rules::new();
    let board = board_from(3, &[1, -1, 1, 1, -1, -1, -1, 1, 1]);
    assert!(rules.legal_moves(&board).is_empty());
    assert_eq!(Ok(Ended(Draw)), rules.is_game_over(&board, Some(8)));
}

#[test]
fn test_player_two_win_is_reported_as_canonical_winner() {
    let rules = Rules::new();
    let board = board_from(3, &[-1, -1, -1, 1, 1, 0, 1, 0, 0]);
    assert_eq!(Ok(Ended(Winner(P1))), rules.is_game_over(&board, Some(0)));
}

#[test]
fn test_play_move_taken_cell() {
    use crate::board_game::GameError;
    use crate::board_game::Player::P2;

    let rules = Rules::new();
    let mut board = Board::new(3);
    assert_eq!(Ok(()), rules.play_move(&mut board, 4, P1));
    let before = board.clone();
    assert_eq!(
        Err(GameError::IllegalMove(4)),
        rules.play_move(&mut board, 4, P2)
    );
    assert_eq!(before, board);
    assert_eq!(P2, rules.opponent(P1));
}

#[test]
fn test_larger_board() {
    let rules = Rules::new();
    let board = board_from(
        4,
        &[-1, 0, 0, 1, 0, -1, 1, 0, 0, 1, -1, 0, 1, 0, 0, 0],
    );
    assert_eq!(Ok(true), rules.check_win(&board, Some(12)));
    assert_eq!(Ok(false), rules.check_win(&board, Some(10)));
}
