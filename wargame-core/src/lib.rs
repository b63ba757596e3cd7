//! AI Wargame Core - Game engine and adversarial search
//!
//! This crate provides the core logic for the AI Wargame:
//! - Square-grid board geometry
//! - Unit types, combat and repair tables
//! - Game state and move-candidate generation
//! - Explicit search tree with arena allocation
//! - Minimax and alpha-beta search
//! - Heuristic evaluation functions e0/e1/e2
//! - Move orchestration with search statistics

pub mod board;
pub mod eval;
pub mod game;
pub mod search;
pub mod suggest;
pub mod tree;
pub mod units;

// Re-exports for convenient access
pub use board::Coord;
pub use eval::{Heuristic, Weights};
pub use game::{GameError, GameState, Move, DEFAULT_DIM, DEFAULT_MAX_TURNS};
pub use search::{alphabeta, minimax, Telemetry};
pub use suggest::{
    branching_factor, suggest_move, suggest_move_with_rng, Algorithm, SearchConfig, SearchError,
    SearchStats, Suggestion,
};
pub use tree::{NodeId, Tree, TreeNode};
pub use units::{Player, Unit, UnitType, MAX_HEALTH};
