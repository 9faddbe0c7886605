//! Command-line front end: play against the MCTS agent or pit it against a random one.
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use tictactoe_mcts::{run_arena, ArenaConfig, HumanAgent, MctsConfig, Session};

/// Tic-tac-toe against a Monte Carlo tree search opponent.
#[derive(Parser)]
#[command(name = "tictactoe-mcts")]
struct Cli {
    /// Log level, overridden by RUST_LOG.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the AI in the terminal.
    Play {
        /// Side length of the board.
        #[arg(long, default_value = "3")]
        size: usize,

        /// MCTS iterations per move. Drawn at random from [50, 100) per match if omitted.
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Let the AI make the first move.
        #[arg(long)]
        ai_first: bool,

        /// Random seed for the AI.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Play MCTS against a random agent many times and report the results.
    Arena {
        /// Number of matches.
        #[arg(short, long, default_value = "100")]
        games: usize,

        /// MCTS iterations per move.
        #[arg(short, long, default_value = "100")]
        iterations: usize,

        /// Side length of the board.
        #[arg(long, default_value = "3")]
        size: usize,

        /// Base random seed.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Worker threads, defaults to the number of CPUs.
        #[arg(short, long)]
        threads: Option<usize>,
    },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn play(size: usize, iterations: Option<usize>, ai_first: bool, seed: Option<u64>) -> Result<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = Session::new(size, iterations, ai_first, HumanAgent::stdin(), rng);
    let summaries = session.run()?;
    info!(matches = summaries.len(), "session over");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Play {
            size,
            iterations,
            ai_first,
            seed,
        } => {
            if size == 0 {
                bail!("board size must be at least 1");
            }
            play(size, iterations, ai_first, seed)
        }
        Commands::Arena {
            games,
            iterations,
            size,
            seed,
            threads,
        } => {
            if size == 0 {
                bail!("board size must be at least 1");
            }
            let mut config = ArenaConfig {
                games,
                size,
                seed,
                mcts: MctsConfig::with_iterations(iterations),
                ..Default::default()
            };
            if let Some(threads) = threads {
                config.threads = threads;
            }
            let report = run_arena(&config);
            println!(
                "MCTS wins: {}, random wins: {}, draws: {}, errors: {}",
                report.mcts_wins, report.random_wins, report.draws, report.errors
            );
            Ok(())
        }
    }
}
