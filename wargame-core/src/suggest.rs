//! Move orchestrator: configuration, search dispatch, and statistics

use crate::eval::{Heuristic, Weights};
use crate::game::{GameError, GameState, Move};
use crate::search::{alphabeta, minimax, Telemetry};
use crate::tree::{NodeId, Tree};
use crate::units::Player;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Search algorithm selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Minimax,
    AlphaBeta,
}

/// Orchestrator configuration. A fresh tree is built per call; nothing is
/// cached or shared across searches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    /// Explicit heuristic; `None` picks the algorithm default (e1 for
    /// minimax, e2 for alpha-beta).
    pub heuristic: Option<Heuristic>,
    /// Maximum search depth in plies; must be at least 1.
    pub max_depth: u32,
    /// Wall-clock budget for tree expansion; `None` means unbounded.
    pub time_budget: Option<Duration>,
    /// Seed for e2's perturbation; `None` disables the noise so repeated
    /// runs are reproducible.
    pub noise_seed: Option<u64>,
    pub weights: Weights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::AlphaBeta,
            heuristic: None,
            max_depth: 4,
            time_budget: Some(Duration::from_secs(5)),
            noise_seed: None,
            weights: Weights::default(),
        }
    }
}

impl SearchConfig {
    /// Heuristic actually used at the leaves.
    pub fn resolved_heuristic(&self) -> Heuristic {
        self.heuristic.unwrap_or(match self.algorithm {
            Algorithm::Minimax => Heuristic::E1,
            Algorithm::AlphaBeta => Heuristic::E2,
        })
    }
}

/// Statistics of one completed search, the only externally observable
/// artifact beyond the chosen move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchStats {
    pub nodes_visited: usize,
    pub leaf_evals: usize,
    /// Subtrees cut off by pruning (0 for minimax).
    pub pruned_subtrees: usize,
    pub elapsed: Duration,
    /// Average children per expanded internal node.
    pub branching_factor: f64,
    /// True when the time budget stopped expansion and the move is a
    /// best-so-far rather than an exhaustive decision.
    pub budget_exceeded: bool,
}

/// Orchestrator result: either a searched move or a terminal verdict when
/// the mover has no continuation.
#[derive(Clone, Debug)]
pub enum Suggestion {
    Move {
        mv: Move,
        score: i64,
        stats: SearchStats,
    },
    /// The position is already decided (or the mover forfeits with zero
    /// candidates); nothing was searched.
    Terminal { winner: Option<Player> },
}

/// Orchestrator errors. Time-budget exhaustion is deliberately not here:
/// it degrades to a best-so-far move flagged in the stats.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Depth 0 cannot produce a move; a caller configuration error,
    /// surfaced before any search begins.
    #[error("max_depth must be at least 1")]
    ZeroDepth,
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Diagnostic re-export: branching factor of any completed tree.
pub fn branching_factor(tree: &Tree) -> f64 {
    tree.branching_factor()
}

/// Pick the best move for `state` under `config`: build a fresh tree, run
/// the configured search with the configured heuristic at the leaves, and
/// return the chosen root move plus statistics. The noise generator is
/// seeded from `config.noise_seed` anew on every call, so repeated calls
/// on the same state are reproducible.
pub fn suggest_move(state: &GameState, config: &SearchConfig) -> Result<Suggestion, SearchError> {
    let mut noise = config.noise_seed.map(ChaCha8Rng::seed_from_u64);
    suggest_move_with_rng(state, config, &mut noise)
}

/// Like `suggest_move`, but e2's perturbation is drawn from a caller-owned
/// generator that keeps advancing across calls. Iterated self-play threads
/// one generator through the whole game, so a recurring position draws
/// fresh noise instead of replaying the previous draw and repetition
/// cycles can actually break. `config.noise_seed` is not consulted here;
/// `None` disables the noise term.
pub fn suggest_move_with_rng(
    state: &GameState,
    config: &SearchConfig,
    noise: &mut Option<ChaCha8Rng>,
) -> Result<Suggestion, SearchError> {
    if config.max_depth == 0 {
        return Err(SearchError::ZeroDepth);
    }

    if state.is_terminal() {
        return Ok(Suggestion::Terminal {
            winner: state.winner(),
        });
    }
    if state.move_candidates().is_empty() {
        // No candidates at the root: the mover forfeits
        return Ok(Suggestion::Terminal {
            winner: Some(state.to_move().opponent()),
        });
    }

    let start = Instant::now();
    let deadline = config.time_budget.map(|budget| start + budget);

    let mut tree = Tree::build(state.clone(), config.max_depth, deadline, &config.weights)?;
    if config.algorithm == Algorithm::AlphaBeta {
        tree.order_siblings();
    }

    let heuristic = config.resolved_heuristic();
    let mut telemetry = Telemetry::default();

    let (score, chosen) = match config.algorithm {
        Algorithm::Minimax => minimax(
            &mut tree,
            NodeId::ROOT,
            heuristic,
            &config.weights,
            noise,
            &mut telemetry,
        ),
        Algorithm::AlphaBeta => alphabeta(
            &mut tree,
            NodeId::ROOT,
            heuristic,
            &config.weights,
            noise,
            &mut telemetry,
        ),
    };

    // The root always expands (candidates were non-empty), so a chosen
    // child exists even when the budget cut expansion short.
    let chosen = chosen.expect("root has children");
    let mv = tree
        .get(chosen)
        .incoming_move
        .expect("non-root node has an incoming move");

    let stats = SearchStats {
        nodes_visited: telemetry.nodes_visited,
        leaf_evals: telemetry.leaf_evals,
        pruned_subtrees: telemetry.pruned_subtrees,
        elapsed: start.elapsed(),
        branching_factor: tree.branching_factor(),
        budget_exceeded: tree.budget_exceeded(),
    };

    tracing::debug!(
        ?mv,
        score,
        nodes = stats.nodes_visited,
        leaves = stats.leaf_evals,
        pruned = stats.pruned_subtrees,
        branching = stats.branching_factor,
        budget_exceeded = stats.budget_exceeded,
        "search complete"
    );

    Ok(Suggestion::Move { mv, score, stats })
}

// ============================================================================
// TESTS
// ============================================================================
