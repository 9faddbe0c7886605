//! Monte Carlo tree search agent.
use std::f64;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::agents::search_tree::{NodeId, SearchTree, TreeNode};
use crate::agents::BoardGameAgent;
use crate::board_game::EndState::{Draw, Winner};
use crate::board_game::GameState::{Ended, Ongoing};
use crate::board_game::Player::P1;
use crate::board_game::{GameError, GameState, Player, Result};
use crate::rules::Rules;
use crate::tictactoe::Board;

// From UCT formula, "theoretically equivalent to sqrt(2)" - see
// https://en.wikipedia.org/wiki/Monte_Carlo_tree_search#Exploration_and_exploitation
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = f64::consts::SQRT_2;

pub const DEFAULT_ITERATIONS: usize = 100;

/// Range the iteration budget is drawn from when a match picks a random AI strength.
const RANDOM_STRENGTH_MIN: usize = 50;
const RANDOM_STRENGTH_MAX: usize = 100;

/// Search parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MctsConfig {
    /// Number of select/expand/simulate/backpropagate rounds per decision.
    pub iterations: usize,
    /// Weight of the exploration term in UCB1.
    pub exploration_constant: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            iterations: DEFAULT_ITERATIONS,
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(iterations: usize) -> Self {
        MctsConfig {
            iterations,
            ..Default::default()
        }
    }

    /// A config whose iteration budget is drawn uniformly from [50, 100), so consecutive matches
    /// face opponents of slightly different strength.
    pub fn with_random_strength(rng: &mut impl Rng) -> Self {
        Self::with_iterations(rng.gen_range(RANDOM_STRENGTH_MIN..RANDOM_STRENGTH_MAX))
    }
}

/// Outcome of one search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Chosen cell index, None only if the board had no legal moves.
    pub best_move: Option<usize>,
    /// Visit count of the root child for each cell index (0 for cells that were never tried).
    pub visits: Vec<u32>,
    /// `visits` normalised to sum to 1, or all zeros if nothing was visited.
    pub policy: Vec<f64>,
    /// Iterations actually run.
    pub iterations: usize,
}

/// Monte Carlo tree search over perspective-flipped boards: every node stores its position as
/// seen by the player about to move there, who is always P1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mcts {
    rules: Rules,
    config: MctsConfig,
}

impl Mcts {
    pub fn new(config: MctsConfig) -> Mcts {
        Mcts {
            rules: Rules::new(),
            config,
        }
    }

    /// Choose a move for the player to move on `board`, encoded as P1. The board is not modified.
    pub fn solve(&self, board: &Board, rng: &mut impl Rng) -> Result<Option<usize>> {
        Ok(self.search(board, rng)?.best_move)
    }

    /// Build a fresh tree from `board`, run the configured iterations and report the root's visit
    /// distribution along with the chosen move.
    pub fn search(&self, board: &Board, rng: &mut impl Rng) -> Result<SearchResult> {
        let legal_moves = self.rules.legal_moves(board);
        let num_cells = board.num_cells();
        if legal_moves.is_empty() {
            return Ok(SearchResult {
                best_move: None,
                visits: vec![0; num_cells],
                policy: vec![0.; num_cells],
                iterations: 0,
            });
        }
        let first_legal = legal_moves[0];

        let mut tree = SearchTree::new(TreeNode::new(board.clone(), None, None, legal_moves));
        for _ in 0..self.config.iterations {
            self.iterate(&mut tree, rng)?;
        }

        let mut visits = vec![0; num_cells];
        for &child_id in tree.root().children.iter() {
            let child = tree.get(child_id);
            if let Some(move_) = child.move_ {
                visits[move_] = child.visits;
            }
        }
        let total: u32 = visits.iter().sum();
        let policy: Vec<f64> = if total == 0 {
            vec![0.; num_cells]
        } else {
            visits.iter().map(|&v| v as f64 / total as f64).collect()
        };

        // first index with a strictly greater share wins, so ties go to the lowest cell index
        let mut best_move = None;
        let mut best_share = 0.;
        for (i, &share) in policy.iter().enumerate() {
            if share > best_share {
                best_move = Some(i);
                best_share = share;
            }
        }

        Ok(SearchResult {
            best_move: best_move.or(Some(first_legal)),
            visits,
            policy,
            iterations: self.config.iterations,
        })
    }

    /// One round of search: select a leaf, expand it unless the game ended there, play a random
    /// game out from the new child and push the result back up to the root.
    fn iterate(&self, tree: &mut SearchTree, rng: &mut impl Rng) -> Result<()> {
        let mut node = NodeId::ROOT;
        while tree.get(node).is_fully_expanded() {
            node = tree.select_child(node, self.config.exploration_constant)?;
        }

        let leaf = tree.get(node);
        let state = self.rules.is_game_over(&leaf.board, leaf.move_)?;
        let mut value = Self::terminal_value(state);

        if state == Ongoing {
            if let Some(child) = self.expand(tree, node, rng)? {
                value = self.simulate(tree.get(child), rng)?;
                node = child;
            }
        }

        tree.backpropagate(node, value);
        Ok(())
    }

    /// Value of a finished game for the player about to move. The game can only have been won by
    /// the side that just moved, so a win is a loss here.
    fn terminal_value(state: GameState) -> i32 {
        match state {
            Ended(Winner(winner)) => winner.get_opponent().value(),
            Ended(Draw) | Ongoing => 0,
        }
    }

    /// Play one untried move from `id` as P1, flip the result so the opponent becomes P1 and add
    /// it as a new child. Returns None if every move has already been tried.
    fn expand(
        &self,
        tree: &mut SearchTree,
        id: NodeId,
        rng: &mut impl Rng,
    ) -> Result<Option<NodeId>> {
        let move_ = match tree.get_mut(id).untried.pop_random(rng) {
            Some(move_) => move_,
            None => return Ok(None),
        };

        let mut board = tree.get(id).board.clone();
        self.rules.play_move(&mut board, move_, P1)?;
        let board = board.flip_perspective();
        let legal_moves = self.rules.legal_moves(&board);

        let child = TreeNode::new(board, Some(move_), Some(id), legal_moves);
        Ok(Some(tree.add_child(id, child)))
    }

    /// Play uniformly random moves from `node` until the game ends. Returns +1 if the player to
    /// move at `node` wins, -1 if they lose and 0 for a draw.
    fn simulate(&self, node: &TreeNode, rng: &mut impl Rng) -> Result<i32> {
        let state = self.rules.is_game_over(&node.board, node.move_)?;
        if let Ended(_) = state {
            return Ok(Self::terminal_value(state));
        }

        let mut board = node.board.clone();
        let mut player = P1;
        loop {
            let move_ = match self.rules.legal_moves(&board).choose(rng) {
                Some(&move_) => move_,
                None => return Ok(0),
            };
            self.rules.play_move(&mut board, move_, player)?;
            match self.rules.is_game_over(&board, Some(move_))? {
                Ended(Winner(_)) => return Ok(player.value()),
                Ended(Draw) => return Ok(0),
                Ongoing => player = self.rules.opponent(player),
            }
        }
    }
}

#[derive(Clone, Debug)]
/// AI agent that plays using Monte Carlo tree search to choose moves. A fresh tree is built for
/// every decision.
pub struct MctsAgent<R: Rng> {
    mcts: Mcts,
    rng: R,
}

impl<R: Rng> MctsAgent<R> {
    pub fn new(config: MctsConfig, rng: R) -> MctsAgent<R> {
        MctsAgent {
            mcts: Mcts::new(config),
            rng,
        }
    }
}

impl<R: Rng> BoardGameAgent for MctsAgent<R> {
    fn choose_move(&mut self, board: &Board, player: Player) -> Result<usize> {
        let now = Instant::now();
        // the search always plays as P1
        let perspective = match player {
            P1 => board.clone(),
            _ => board.flip_perspective(),
        };
        let result = self.mcts.search(&perspective, &mut self.rng)?;
        let best_move = result.best_move.ok_or(GameError::NoLegalMove)?;
        debug!(
            ?player,
            best_move,
            iterations = result.iterations,
            visits = ?result.visits,
            elapsed = ?now.elapsed(),
            "MCTS chose a move"
        );
        Ok(best_move)
    }
}

#[cfg(test)]
fn seeded(seed: u64) -> rand_chacha::ChaCha8Rng {
    use rand::SeedableRng;
    rand_chacha::ChaCha8Rng::seed_from_u64(seed)
}

#[cfg(test)]
fn board_from(cells: &[i32]) -> Board {
    use crate::board_game::Cell::{Empty, Full};
    use crate::board_game::Player::P2;

    let cells = cells
        .iter()
        .map(|&v| match v {
            1 => Full(P1),
            -1 => Full(P2),
            _ => Empty,
        })
        .collect();
    Board::from_cells(3, cells).unwrap()
}

#[test]
fn test_single_legal_move_is_always_chosen() {
    let board = board_from(&[1, -1, 1, 1, -1, -1, -1, 1, 0]);
    for iterations in [0, 1, 5, 100] {
        let mcts = Mcts::new(MctsConfig::with_iterations(iterations));
        assert_eq!(Ok(Some(8)), mcts.solve(&board, &mut seeded(iterations as u64)));
    }
}

#[test]
fn test_no_legal_moves_returns_none() {
    let board = board_from(&[1, -1, 1, 1, -1, -1, -1, 1, 1]);
    let mcts = Mcts::default();
    assert_eq!(Ok(None), mcts.solve(&board, &mut seeded(0)));
}

#[test]
fn test_solve_does_not_modify_board() {
    let board = board_from(&[1, 0, 0, 0, -1, 0, 0, 0, 0]);
    let before = board.clone();
    let mcts = Mcts::default();
    mcts.solve(&board, &mut seeded(3)).unwrap();
    assert_eq!(before, board);
}

#[test]
fn test_root_child_visits_sum_to_iterations() {
    for (seed, iterations) in [(1, 1), (2, 10), (3, 100), (4, 500)] {
        let mcts = Mcts::new(MctsConfig::with_iterations(iterations));
        let result = mcts.search(&Board::new(3), &mut seeded(seed)).unwrap();
        let total: u32 = result.visits.iter().sum();
        assert_eq!(iterations as u32, total);
        assert_eq!(iterations, result.iterations);
        let policy_sum: f64 = result.policy.iter().sum();
        assert!((policy_sum - 1.).abs() < 1e-9);
    }
}

#[test]
fn test_visits_only_on_legal_moves() {
    let board = board_from(&[1, 0, -1, 0, 1, 0, -1, 0, 0]);
    let mcts = Mcts::new(MctsConfig::with_iterations(200));
    let result = mcts.search(&board, &mut seeded(11)).unwrap();
    for i in [0, 2, 4, 6] {
        assert_eq!(0, result.visits[i]);
    }
    assert!(Rules::new()
        .legal_moves(&board)
        .contains(&result.best_move.unwrap()));
}

#[test]
fn test_takes_immediate_win() {
    // P1 to move, completing the top row at 2 wins
    let board = board_from(&[1, 1, 0, -1, -1, 0, 0, 0, 0]);
    let mcts = Mcts::new(MctsConfig::with_iterations(1000));
    for seed in 0..5 {
        assert_eq!(Ok(Some(2)), mcts.solve(&board, &mut seeded(seed)));
    }
}

#[test]
fn test_blocks_immediate_loss() {
    // P2 threatens the middle row at 5, P1 has no win of its own
    let board = board_from(&[1, 0, 0, -1, -1, 0, 0, 0, 1]);
    let mcts = Mcts::new(MctsConfig::with_iterations(2000));
    for seed in 0..5 {
        assert_eq!(Ok(Some(5)), mcts.solve(&board, &mut seeded(seed)));
    }
}

#[test]
fn test_agent_plays_as_either_player() {
    // P2 to move can win at 5
    let board = board_from(&[1, 1, 0, -1, -1, 0, 1, 0, 0]);
    let mut agent = MctsAgent::new(MctsConfig::with_iterations(1000), seeded(9));
    assert_eq!(Ok(5), agent.choose_move(&board, crate::board_game::Player::P2));
}

#[test]
fn test_random_strength_range() {
    let mut rng = seeded(5);
    for _ in 0..50 {
        let config = MctsConfig::with_random_strength(&mut rng);
        assert!((50..100).contains(&config.iterations));
        assert_eq!(DEFAULT_EXPLORATION_CONSTANT, config.exploration_constant);
    }
}
