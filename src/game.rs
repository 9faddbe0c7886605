//! Match loop: owns the authoritative board and alternates turns between two agents.
use tracing::{debug, info};

use crate::agents::BoardGameAgent;
use crate::board_game::EndState::{Draw, Winner};
use crate::board_game::GameState::{Ended, Ongoing};
use crate::board_game::Player::P1;
use crate::board_game::{EndState, GameState, Player, Result};
use crate::rules::Rules;
use crate::tictactoe::Board;

/// One game between two agents.
#[derive(Clone, Debug)]
pub struct Match {
    board: Board,
    rules: Rules,
    // who gets to make the next move?
    to_move: Player,
    state: GameState,
}

impl Match {
    /// Start a match on an empty board of `size * size` cells. P1 moves first.
    pub fn new(size: usize) -> Match {
        Match {
            board: Board::new(size),
            rules: Rules::new(),
            to_move: P1,
            state: Ongoing,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Ask `agent` for a move for the player whose turn it is, apply it and check whether it
    /// ended the game. The rules report any win as P1's, so it is re-attributed to the mover.
    /// An illegal move leaves the board and the turn unchanged.
    pub fn play_turn(&mut self, agent: &mut impl BoardGameAgent) -> Result<GameState> {
        if let Ended(_) = self.state {
            return Ok(self.state);
        }

        let player = self.to_move;
        let move_ = agent.choose_move(&self.board, player)?;
        self.rules.play_move(&mut self.board, move_, player)?;
        debug!(?player, move_, "move played");

        self.state = match self.rules.is_game_over(&self.board, Some(move_))? {
            Ended(Winner(_)) => Ended(Winner(player)),
            Ended(Draw) => Ended(Draw),
            Ongoing => {
                self.to_move = self.rules.opponent(player);
                Ongoing
            }
        };
        Ok(self.state)
    }

    /// Alternate turns between `p1` and `p2` until the game ends.
    pub fn play(
        &mut self,
        p1: &mut impl BoardGameAgent,
        p2: &mut impl BoardGameAgent,
    ) -> Result<EndState> {
        loop {
            let state = match self.to_move {
                P1 => self.play_turn(p1)?,
                _ => self.play_turn(p2)?,
            };
            if let Ended(endstate) = state {
                info!(?endstate, "match finished");
                return Ok(endstate);
            }
        }
    }
}

#[cfg(test)]
/// Agent that replays a fixed list of moves.
struct Scripted(std::vec::IntoIter<usize>);

#[cfg(test)]
impl BoardGameAgent for Scripted {
    fn choose_move(&mut self, _board: &Board, _player: Player) -> Result<usize> {
        self.0
            .next()
            .ok_or(crate::board_game::GameError::NoLegalMove)
    }
}

#[test]
fn test_winner_is_the_real_mover() {
    use crate::board_game::Player::P2;

    let mut game = Match::new(3);
    let mut p1 = Scripted(vec![0, 1, 8].into_iter());
    let mut p2 = Scripted(vec![3, 4, 5].into_iter());
    assert_eq!(Ok(Winner(P2)), game.play(&mut p1, &mut p2));
    assert_eq!(Ended(Winner(P2)), game.state());
}

#[test]
fn test_draw() {
    let mut game = Match::new(3);
    let mut p1 = Scripted(vec![4, 2, 3, 7, 8].into_iter());
    let mut p2 = Scripted(vec![0, 6, 5, 1].into_iter());
    assert_eq!(Ok(Draw), game.play(&mut p1, &mut p2));
}

#[test]
fn test_illegal_move_keeps_turn_and_board() {
    use crate::board_game::GameError;

    let mut game = Match::new(3);
    game.play_turn(&mut Scripted(vec![4].into_iter())).unwrap();
    let before = game.board().clone();
    let to_move = game.to_move();
    assert_eq!(
        Err(GameError::IllegalMove(4)),
        game.play_turn(&mut Scripted(vec![4].into_iter()))
    );
    assert_eq!(&before, game.board());
    assert_eq!(to_move, game.to_move());
    assert_eq!(Ongoing, game.state());
}

#[test]
fn test_mcts_never_loses_to_random() {
    use crate::agents::{MctsAgent, MctsConfig, RandomAgent};
    use crate::board_game::Player::P2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    for seed in 0..5 {
        let mut game = Match::new(3);
        let mut mcts = MctsAgent::new(
            MctsConfig::with_iterations(2000),
            ChaCha8Rng::seed_from_u64(seed),
        );
        let mut random = RandomAgent::new(ChaCha8Rng::seed_from_u64(seed + 100));
        let result = game.play(&mut mcts, &mut random).unwrap();
        assert_ne!(Winner(P2), result);
    }
}
