//! Batches of independent MCTS-vs-random matches, played in parallel.
use std::sync::Mutex;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use scoped_threadpool::Pool;
use tracing::{info, warn};

use crate::agents::{MctsAgent, MctsConfig, RandomAgent};
use crate::board_game::EndState::{Draw, Winner};
use crate::board_game::Player::{P1, P2};
use crate::board_game::{EndState, Player, Result};
use crate::game::Match;

/// Arena parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaConfig {
    /// Number of matches to play.
    pub games: usize,
    /// Side length of the board.
    pub size: usize,
    /// Base seed. Match `i` seeds its agents from `seed + i`.
    pub seed: u64,
    /// Worker threads.
    pub threads: usize,
    pub mcts: MctsConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            games: 100,
            size: 3,
            seed: 42,
            threads: num_cpus::get(),
            mcts: MctsConfig::default(),
        }
    }
}

/// Tally of arena results from the MCTS agent's point of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaReport {
    pub mcts_wins: usize,
    pub random_wins: usize,
    pub draws: usize,
    // matches that stopped with an error
    pub errors: usize,
}

impl ArenaReport {
    pub fn total(&self) -> usize {
        self.mcts_wins + self.random_wins + self.draws + self.errors
    }

    fn record(&mut self, mcts_player: Player, outcome: &Result<EndState>) {
        match outcome {
            Ok(Winner(winner)) if *winner == mcts_player => self.mcts_wins += 1,
            Ok(Winner(_)) => self.random_wins += 1,
            Ok(Draw) => self.draws += 1,
            Err(_) => self.errors += 1,
        }
    }
}

/// Play one match. The MCTS agent takes the first move in even-numbered games and the second in
/// odd-numbered ones.
fn play_one(config: &ArenaConfig, game_index: usize) -> (Player, Result<EndState>) {
    let seed = config.seed.wrapping_add(game_index as u64);
    let mut mcts = MctsAgent::new(config.mcts, ChaCha8Rng::seed_from_u64(seed));
    // separate stream so the two agents never share random draws
    let mut random = RandomAgent::new(ChaCha8Rng::seed_from_u64(seed ^ 0x5eed));
    let mut game = Match::new(config.size);

    if game_index % 2 == 0 {
        (P1, game.play(&mut mcts, &mut random))
    } else {
        (P2, game.play(&mut random, &mut mcts))
    }
}

/// Run `config.games` matches across a pool of `config.threads` workers. Each match owns its
/// board, tree and random streams, so nothing but the report is shared.
pub fn run_arena(config: &ArenaConfig) -> ArenaReport {
    let now = Instant::now();
    let report = Mutex::new(ArenaReport::default());
    let mut pool = Pool::new(config.threads.max(1) as u32);

    pool.scoped(|scoped| {
        for game_index in 0..config.games {
            let report = &report;
            scoped.execute(move || {
                let (mcts_player, outcome) = play_one(config, game_index);
                if let Err(err) = &outcome {
                    warn!(game_index, %err, "match aborted");
                }
                // a poisoned lock only means another worker panicked mid-update
                let mut report = report.lock().unwrap_or_else(|e| e.into_inner());
                report.record(mcts_player, &outcome);
            });
        }
    });

    let report = report.into_inner().unwrap_or_else(|e| e.into_inner());
    info!(
        games = config.games,
        mcts_wins = report.mcts_wins,
        random_wins = report.random_wins,
        draws = report.draws,
        errors = report.errors,
        elapsed = ?now.elapsed(),
        "arena finished"
    );
    report
}

#[test]
fn test_arena_tallies_every_game() {
    let config = ArenaConfig {
        games: 12,
        threads: 4,
        mcts: MctsConfig::with_iterations(200),
        ..Default::default()
    };
    let report = run_arena(&config);
    assert_eq!(12, report.total());
    assert_eq!(0, report.errors);
    assert!(report.mcts_wins > report.random_wins);
}

#[test]
fn test_arena_is_reproducible() {
    let config = ArenaConfig {
        games: 6,
        threads: 3,
        seed: 7,
        mcts: MctsConfig::with_iterations(50),
        ..Default::default()
    };
    assert_eq!(run_arena(&config), run_arena(&config));
}

#[test]
fn test_record() {
    let mut report = ArenaReport::default();
    report.record(P1, &Ok(Winner(P1)));
    report.record(P2, &Ok(Winner(P1)));
    report.record(P2, &Ok(Draw));
    report.record(P1, &Err(crate::board_game::GameError::NoLegalMove));
    assert_eq!(
        ArenaReport {
            mcts_wins: 1,
            random_wins: 1,
            draws: 1,
            errors: 1
        },
        report
    );
}
