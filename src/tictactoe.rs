//! Tic Tac Toe board.
use std::fmt;

use crate::board_game::Cell::{Empty, Full};
use crate::board_game::Player::{P1, P2};
use crate::board_game::{Cell, GameError, Player, Result};

/// Store the size and state of the tic-tac-toe board.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    // dimension of the board (total number of cells = size * size)
    size: usize,
    // row-major, index = row * size + col
    cells: Vec<Cell>,
}

impl fmt::Debug for Board {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let mut board_repr = String::new();
        for cell in self.cells.iter() {
            let cell_repr = match cell {
                Empty => '.',
                Full(player) => player.symbol(),
            };
            board_repr.push(cell_repr);
        }
        write!(
            formatter,
            "Board {{ size: {}, cells: [{}] }}",
            self.size, board_repr
        )
    }
}

/// Print the board with empty cells labelled by the 1-based index a human types to play there:
///
///  1 | 2 | O
/// ---+---+---
///  4 | X | 6
/// ---+---+---
///  7 | 8 | 9
impl fmt::Display for Board {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let width = self.num_cells().to_string().len();
        let separator = vec!["-".repeat(width + 2); self.size].join("+");
        for row in 0..self.size {
            let line: Vec<String> = (0..self.size)
                .map(|col| {
                    let idx = row * self.size + col;
                    match self.cells[idx] {
                        Empty => format!(" {:>width$} ", idx + 1, width = width),
                        Full(player) => format!(" {:>width$} ", player.symbol(), width = width),
                    }
                })
                .collect();
            writeln!(formatter, "{}", line.join("|"))?;
            if row + 1 < self.size {
                writeln!(formatter, "{}", separator)?;
            }
        }
        Ok(())
    }
}

/// Representation of an N-dimensional tic-tac-toe board.
impl Board {
    /// Return a new Board of (size * size) empty cells.
    pub fn new(size: usize) -> Board {
        Board {
            cells: vec![Empty; size * size],
            size,
        }
    }

    /// Build a board from row-major cells, failing if there are not exactly size * size of them.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Board> {
        if cells.len() != size * size {
            return Err(GameError::InvalidBoard {
                size,
                expected: size * size,
                actual: cells.len(),
            });
        }
        Ok(Board { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.cells.len() {
            return Err(GameError::OutOfRange {
                index,
                cells: self.cells.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Cell> {
        self.check_index(index)?;
        Ok(self.cells[index])
    }

    /// Occupy an empty cell. Fails without touching the board if the cell is taken.
    pub fn set(&mut self, index: usize, player: Player) -> Result<()> {
        self.check_index(index)?;
        match self.cells[index] {
            Empty => {
                self.cells[index] = Full(player);
                Ok(())
            }
            Full(_) => Err(GameError::IllegalMove(index)),
        }
    }

    pub fn row_col(&self, index: usize) -> Result<(usize, usize)> {
        self.check_index(index)?;
        Ok((index / self.size, index % self.size))
    }

    /// Return a copy of the board with P1 and P2 swapped on every cell, so that whoever is about
    /// to move is encoded as P1.
    pub fn flip_perspective(&self) -> Board {
        let cells = self
            .cells
            .iter()
            .map(|cell| match cell {
                Empty => Empty,
                Full(P1) => Full(P2),
                Full(P2) => Full(P1),
            })
            .collect();
        Board {
            size: self.size,
            cells,
        }
    }
}

#[test]
fn test_get_and_set() {
    let mut board = Board::new(3);
    assert_eq!(board.num_cells(), 9);
    assert_eq!(Ok(Empty), board.get(4));

    assert_eq!(Ok(()), board.set(4, P1));
    assert_eq!(Ok(Full(P1)), board.get(4));
    assert_eq!(
        Err(GameError::OutOfRange { index: 9, cells: 9 }),
        board.get(9)
    );
    assert_eq!(
        Err(GameError::OutOfRange { index: 9, cells: 9 }),
        board.set(9, P2)
    );
}

#[test]
fn test_set_taken_cell_leaves_board_unchanged() {
    let mut board = Board::new(3);
    board.set(0, P1).unwrap();
    let before = board.clone();
    assert_eq!(Err(GameError::IllegalMove(0)), board.set(0, P2));
    assert_eq!(before, board);
}

#[test]
fn test_row_col() {
    let board = Board::new(3);
    assert_eq!(Ok((0, 0)), board.row_col(0));
    assert_eq!(Ok((1, 2)), board.row_col(5));
    assert_eq!(Ok((2, 1)), board.row_col(7));
    assert!(board.row_col(9).is_err());
}

#[test]
fn test_clone_is_independent() {
    let mut board = Board::new(3);
    let copy = board.clone();
    board.set(3, P2).unwrap();
    assert_eq!(Ok(Empty), copy.get(3));
}

#[test]
fn test_from_cells_checks_length() {
    assert_eq!(
        Err(GameError::InvalidBoard {
            size: 3,
            expected: 9,
            actual: 4
        }),
        Board::from_cells(3, vec![Empty; 4])
    );
    assert!(Board::from_cells(2, vec![Empty; 4]).is_ok());
}

#[test]
fn test_flip_perspective() {
    let board = Board::from_cells(
        2,
        vec![Full(P1), Empty, Full(P2), Full(P1)],
    )
    .unwrap();
    let flipped = board.flip_perspective();
    assert_eq!(flipped.cells(), &[Full(P2), Empty, Full(P1), Full(P2)]);
    assert_eq!(board, flipped.flip_perspective());
}

#[test]
fn test_display() {
    let mut board = Board::new(3);
    board.set(2, P1).unwrap();
    board.set(4, P2).unwrap();
    let expected = " 1 | 2 | O \n---+---+---\n 4 | X | 6 \n---+---+---\n 7 | 8 | 9 \n";
    assert_eq!(expected, board.to_string());
}
