//! A run of human-vs-AI matches in the terminal. Seats swap after every match and, unless a fixed
//! iteration count was asked for, the AI gets a freshly drawn strength each time.
use std::io::BufRead;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::agents::{HumanAgent, MctsAgent, MctsConfig};
use crate::board_game::{EndState, GameError, GameState, Player, Result};
use crate::game::Match;

/// How one finished match went.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSummary {
    pub ai_player: Player,
    pub iterations: usize,
    pub endstate: EndState,
}

pub struct Session<I: BufRead, R: Rng> {
    size: usize,
    // fixed per-move budget, or None to draw a new one every match
    iterations: Option<usize>,
    ai_player: Player,
    human: HumanAgent<I>,
    rng: R,
}

impl<I: BufRead, R: Rng> Session<I, R> {
    pub fn new(
        size: usize,
        iterations: Option<usize>,
        ai_first: bool,
        human: HumanAgent<I>,
        rng: R,
    ) -> Session<I, R> {
        Session {
            size,
            iterations,
            ai_player: if ai_first { Player::P1 } else { Player::P2 },
            human,
            rng,
        }
    }

    /// The seat the AI takes in the next match.
    pub fn ai_player(&self) -> Player {
        self.ai_player
    }

    fn next_config(&mut self) -> MctsConfig {
        match self.iterations {
            Some(iterations) => MctsConfig::with_iterations(iterations),
            None => MctsConfig::with_random_strength(&mut self.rng),
        }
    }

    /// Play one match on a fresh board with the current seats.
    pub fn play_match(&mut self) -> Result<MatchSummary> {
        let config = self.next_config();
        info!(iterations = config.iterations, ai = ?self.ai_player, "new match");
        let mut ai = MctsAgent::new(config, ChaCha8Rng::seed_from_u64(self.rng.gen()));
        let mut game = Match::new(self.size);

        let endstate = loop {
            println!("\n{}", game.board());
            let turn = if game.to_move() == self.ai_player {
                game.play_turn(&mut ai)
            } else {
                game.play_turn(&mut self.human)
            };
            match turn {
                Ok(GameState::Ended(endstate)) => break endstate,
                Ok(_) => (),
                Err(GameError::IllegalMove(index)) => println!("Cell {} is taken", index + 1),
                Err(err) => return Err(err),
            }
        };

        println!("\n{}", game.board());
        match endstate {
            EndState::Winner(winner) if winner == self.ai_player => {
                println!("Winner: {} (AI)", winner.symbol())
            }
            EndState::Winner(winner) => println!("Winner: {} (you)", winner.symbol()),
            EndState::Draw => println!("Draw!"),
        }
        Ok(MatchSummary {
            ai_player: self.ai_player,
            iterations: config.iterations,
            endstate,
        })
    }

    /// Play matches until the player quits or their input runs out. Returns every finished match.
    pub fn run(&mut self) -> Result<Vec<MatchSummary>> {
        let mut summaries = vec![];
        loop {
            match self.play_match() {
                Ok(summary) => summaries.push(summary),
                Err(GameError::InputClosed) => return Ok(summaries),
                Err(err) => return Err(err),
            }
            self.ai_player = self.ai_player.get_opponent();
            match self.human.ask_next_match() {
                Ok(true) => (),
                Ok(false) | Err(GameError::InputClosed) => return Ok(summaries),
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
fn session(
    input: &'static str,
    iterations: Option<usize>,
) -> Session<std::io::Cursor<&'static str>, ChaCha8Rng> {
    Session::new(
        1,
        iterations,
        false,
        HumanAgent::new(std::io::Cursor::new(input)),
        ChaCha8Rng::seed_from_u64(3),
    )
}

#[test]
fn test_session_redraws_strength_and_swaps_seats() {
    use crate::board_game::Player::{P1, P2};

    // 1x1 board: whoever moves first wins at once
    let summaries = session("1\nn\nq\n", None).run().unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let first = MctsConfig::with_random_strength(&mut rng).iterations;
    let _ai_seed: u64 = rng.gen();
    let second = MctsConfig::with_random_strength(&mut rng).iterations;

    assert_eq!(
        vec![
            MatchSummary {
                ai_player: P2,
                iterations: first,
                endstate: EndState::Winner(P1),
            },
            MatchSummary {
                ai_player: P1,
                iterations: second,
                endstate: EndState::Winner(P1),
            },
        ],
        summaries
    );
}

#[test]
fn test_session_keeps_fixed_iterations() {
    let summaries = session("1\nN\nn\n1\nq\n", Some(7)).run().unwrap();
    assert_eq!(3, summaries.len());
    assert!(summaries.iter().all(|s| s.iterations == 7));
    assert_eq!(Player::P2, summaries[2].ai_player);
}

#[test]
fn test_session_stops_on_quit_or_closed_input() {
    let mut quit = session("1\nq\nn\n", Some(5));
    assert_eq!(1, quit.run().unwrap().len());
    assert_eq!(Player::P1, quit.ai_player());

    // input ends on the human's turn in the third match
    let mut closed = session("1\nn\nn\n", Some(5));
    assert_eq!(2, closed.run().unwrap().len());

    let mut closed_at_prompt = session("1\n", Some(5));
    assert_eq!(1, closed_at_prompt.run().unwrap().len());
}
