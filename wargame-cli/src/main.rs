//! AI Wargame CLI - computer-vs-computer self-play driver

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wargame_core::{
    suggest_move_with_rng, Algorithm, GameState, Heuristic, Player, SearchConfig, Suggestion,
    Weights, DEFAULT_MAX_TURNS,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Minimax,
    Alphabeta,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Minimax => Algorithm::Minimax,
            AlgorithmArg::Alphabeta => Algorithm::AlphaBeta,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    E0,
    E1,
    E2,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::E0 => Heuristic::E0,
            HeuristicArg::E1 => Heuristic::E1,
            HeuristicArg::E2 => Heuristic::E2,
        }
    }
}

#[derive(Parser)]
#[command(name = "wargame")]
#[command(about = "AI Wargame self-play: both sides driven by tree search")]
struct Cli {
    /// Search algorithm for both sides
    #[arg(long, value_enum, default_value = "alphabeta")]
    algorithm: AlgorithmArg,

    /// Heuristic; defaults to e1 for minimax, e2 for alpha-beta
    #[arg(long, value_enum)]
    heuristic: Option<HeuristicArg>,

    /// Maximum search depth in plies
    #[arg(long, default_value = "4")]
    max_depth: u32,

    /// Wall-clock budget per move in seconds
    #[arg(long, default_value = "5.0")]
    max_time: f64,

    /// Turn limit; on exhaustion the Defender wins
    #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
    max_turns: u16,

    /// Seed for e2's perturbation; omit for fully deterministic play
    #[arg(long)]
    seed: Option<u64>,

    /// Load heuristic weights from a JSON file instead of the defaults
    #[arg(long)]
    weights: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    if cli.max_depth == 0 {
        bail!("--max-depth must be at least 1");
    }
    let budget = time_budget(cli.max_time)?;

    let weights = match &cli.weights {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read weights file {}", path.display()))?;
            serde_json::from_str::<Weights>(&content)
                .with_context(|| format!("invalid weights file {}", path.display()))?
        }
        None => Weights::default(),
    };

    let config = SearchConfig {
        algorithm: cli.algorithm.into(),
        heuristic: cli.heuristic.map(Into::into),
        max_depth: cli.max_depth,
        time_budget: Some(budget),
        noise_seed: None,
        weights,
    };

    // One generator for the whole game: the noise stream advances move to
    // move, so a recurring position draws fresh perturbation.
    let mut rng = cli.seed.map(ChaCha8Rng::seed_from_u64);

    tracing::info!(
        algorithm = ?config.algorithm,
        heuristic = ?config.resolved_heuristic(),
        depth = config.max_depth,
        "starting self-play"
    );

    let winner = play(
        GameState::standard().with_max_turns(cli.max_turns),
        &config,
        &mut rng,
    )?;
    match winner {
        Some(player) => println!("{:?} wins!", player),
        None => println!("No winner."),
    }
    Ok(())
}

/// Wall-clock budget per move; zero, negative, or non-finite values are a
/// usage error.
fn time_budget(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("--max-time must be a positive number of seconds");
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Alternate searched moves until the game is decided.
fn play(
    mut game: GameState,
    config: &SearchConfig,
    rng: &mut Option<ChaCha8Rng>,
) -> Result<Option<Player>> {
    loop {
        println!("{}", game);

        if let Some(winner) = game.winner() {
            tracing::info!(?winner, turns = game.turns_played(), "game over");
            return Ok(Some(winner));
        }

        match suggest_move_with_rng(&game, config, rng)? {
            Suggestion::Move { mv, score, stats } => {
                tracing::info!(
                    player = ?game.to_move(),
                    %mv,
                    score,
                    nodes = stats.nodes_visited,
                    leaves = stats.leaf_evals,
                    pruned = stats.pruned_subtrees,
                    branching = format!("{:.2}", stats.branching_factor),
                    elapsed_ms = stats.elapsed.as_millis() as u64,
                    budget_exceeded = stats.budget_exceeded,
                    "move chosen"
                );
                game = game.apply(mv)?;
            }
            Suggestion::Terminal { winner } => {
                tracing::info!(?winner, "no continuation for {:?}", game.to_move());
                return Ok(winner);
            }
        }
    }
}
