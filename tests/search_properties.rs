//! Property tests for the board, the rules and the search over random reachable positions.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tictactoe_mcts::{Board, Cell, GameError, GameState, Mcts, MctsConfig, Player, Rules};

/// A position reached by random play, with the last move played (None for the empty board).
fn random_position(size: usize, num_moves: usize, seed: u64) -> (Board, Option<usize>) {
    let rules = Rules::new();
    let mut board = Board::new(size);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut player = Player::P1;
    let mut last_move = None;

    for _ in 0..num_moves {
        if let Ok(GameState::Ended(_)) = rules.is_game_over(&board, last_move) {
            break;
        }
        let moves = rules.legal_moves(&board);
        let move_ = moves[rng.gen_range(0..moves.len())];
        rules.play_move(&mut board, move_, player).unwrap();
        last_move = Some(move_);
        player = player.get_opponent();
    }
    (board, last_move)
}

/// Put the player to move on `board` in the P1 seat, as the search expects.
fn as_player_to_move(board: &Board) -> Board {
    let p1 = board.cells().iter().filter(|c| **c == Cell::Full(Player::P1)).count();
    let p2 = board.cells().iter().filter(|c| **c == Cell::Full(Player::P2)).count();
    if p1 > p2 {
        board.flip_perspective()
    } else {
        board.clone()
    }
}

fn arb_position() -> impl Strategy<Value = (Board, Option<usize>)> {
    (2usize..=4, 0usize..16, any::<u64>()).prop_map(|(size, moves, seed)| {
        random_position(size, moves.min(size * size), seed)
    })
}

proptest! {
    #[test]
    fn prop_legal_moves_are_empty_cells((board, _) in arb_position()) {
        let rules = Rules::new();
        let moves = rules.legal_moves(&board);
        for &m in &moves {
            prop_assert_eq!(Ok(Cell::Empty), board.get(m));
        }
        let empty = board.cells().iter().filter(|c| c.is_empty()).count();
        prop_assert_eq!(empty, moves.len());
        prop_assert!(moves.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_abs_sum_counts_occupied_cells((board, _) in arb_position()) {
        let abs_sum: i32 = board.cells().iter().map(|c| c.value().abs()).sum();
        let occupied = board.cells().iter().filter(|c| !c.is_empty()).count();
        prop_assert_eq!(occupied as i32, abs_sum);
    }

    #[test]
    fn prop_playing_taken_cell_changes_nothing((board, last_move) in arb_position()) {
        if let Some(taken) = last_move {
            let rules = Rules::new();
            let mut copy = board.clone();
            prop_assert_eq!(
                Err(GameError::IllegalMove(taken)),
                rules.play_move(&mut copy, taken, Player::P1)
            );
            prop_assert_eq!(board, copy);
        }
    }

    #[test]
    fn prop_flip_perspective_is_an_involution((board, last_move) in arb_position()) {
        let rules = Rules::new();
        let flipped = board.flip_perspective();
        prop_assert_eq!(&board, &flipped.flip_perspective());
        // flipping relabels owners but never changes whether a line is complete
        prop_assert_eq!(
            rules.is_game_over(&board, last_move),
            rules.is_game_over(&flipped, last_move)
        );
    }

    #[test]
    fn prop_solve_returns_legal_move(
        (board, last_move) in arb_position(),
        seed in any::<u64>(),
        iterations in 1usize..150,
    ) {
        let rules = Rules::new();
        prop_assume!(rules.is_game_over(&board, last_move) == Ok(GameState::Ongoing));
        prop_assume!(!rules.legal_moves(&board).is_empty());

        let board = as_player_to_move(&board);
        let mcts = Mcts::new(MctsConfig::with_iterations(iterations));
        let result = mcts.search(&board, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();

        let best = result.best_move.unwrap();
        prop_assert!(rules.legal_moves(&board).contains(&best));
        prop_assert_eq!(iterations as u32, result.visits.iter().sum::<u32>());
        for (i, &v) in result.visits.iter().enumerate() {
            if v > 0 {
                prop_assert_eq!(Ok(Cell::Empty), board.get(i));
            }
        }
    }

    #[test]
    fn prop_empty_board_move_in_range(seed in any::<u64>()) {
        let mcts = Mcts::default();
        let move_ = mcts.solve(&Board::new(3), &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        prop_assert!(matches!(move_, Some(m) if m < 9));
    }
}

#[test]
fn test_search_is_deterministic_for_a_seed() {
    let mcts = Mcts::new(MctsConfig::with_iterations(300));
    let (board, _) = random_position(3, 2, 17);
    let a = mcts.search(&board, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    let b = mcts.search(&board, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_ties_go_to_lowest_index() {
    // two iterations over two legal moves visit each once, so the shares tie
    let rules = Rules::new();
    let mut board = Board::new(2);
    rules.play_move(&mut board, 0, Player::P1).unwrap();
    rules.play_move(&mut board, 3, Player::P2).unwrap();
    let mcts = Mcts::new(MctsConfig::with_iterations(2));
    for seed in 0..10 {
        let result = mcts.search(&board, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        assert_eq!(vec![0, 1, 1, 0], result.visits);
        assert_eq!(Some(1), result.best_move);
    }
}
