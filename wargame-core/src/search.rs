//! Minimax and alpha-beta search over a built tree
//!
//! Both algorithms evaluate the heuristic exactly once per leaf and
//! propagate scores bottom-up: max at Attacker nodes, min at Defender
//! nodes. The chosen root child is the first in traversal order attaining
//! the root score, so tie-breaks are deterministic. Because the root's
//! children are never reordered and best-tracking uses strict improvement,
//! alpha-beta returns the same root move and score as exhaustive minimax
//! on the same tree and heuristic.

use crate::eval::{Heuristic, Weights};
use crate::tree::{NodeId, Tree};
use crate::units::Player;
use rand_chacha::ChaCha8Rng;

/// Per-search telemetry, the raw numbers behind `SearchStats`.
#[derive(Clone, Debug, Default)]
pub struct Telemetry {
    /// Nodes touched during the search.
    pub nodes_visited: usize,
    /// Heuristic invocations (one per visited leaf).
    pub leaf_evals: usize,
    /// Which leaves were evaluated, for pruning-soundness diagnostics.
    pub evaluated_leaves: Vec<NodeId>,
    /// Subtrees cut off by alpha-beta (always 0 for minimax).
    pub pruned_subtrees: usize,
}

/// Shared leaf handling: evaluate, record, store.
fn evaluate_leaf(
    tree: &mut Tree,
    id: NodeId,
    heuristic: Heuristic,
    weights: &Weights,
    noise: &mut Option<ChaCha8Rng>,
    telemetry: &mut Telemetry,
) -> i64 {
    let score = heuristic.evaluate(&tree.get(id).state, weights, noise.as_mut());
    tree.get_mut(id).score = Some(score);
    telemetry.leaf_evals += 1;
    telemetry.evaluated_leaves.push(id);
    score
}

// ============================================================================
// MINIMAX
// ============================================================================

/// Exhaustive minimax. Returns the node's score and, for internal nodes,
/// the first child in traversal order attaining it.
pub fn minimax(
    tree: &mut Tree,
    id: NodeId,
    heuristic: Heuristic,
    weights: &Weights,
    noise: &mut Option<ChaCha8Rng>,
    telemetry: &mut Telemetry,
) -> (i64, Option<NodeId>) {
    telemetry.nodes_visited += 1;

    if tree.get(id).is_leaf() {
        let score = evaluate_leaf(tree, id, heuristic, weights, noise, telemetry);
        return (score, None);
    }

    let maximizing = tree.get(id).state.to_move() == Player::Attacker;
    let children = tree.get(id).children.clone();

    let mut best: Option<(i64, NodeId)> = None;
    for child in children {
        let (value, _) = minimax(tree, child, heuristic, weights, noise, telemetry);
        let improved = match best {
            None => true,
            Some((best_value, _)) => {
                if maximizing {
                    value > best_value
                } else {
                    value < best_value
                }
            }
        };
        if improved {
            best = Some((value, child));
        }
    }

    let (score, chosen) = best.expect("internal node has at least one child");
    tree.get_mut(id).score = Some(score);
    (score, Some(chosen))
}

// ============================================================================
// ALPHA-BETA
// ============================================================================

/// Alpha-beta pruning entry point with bounds initialized to
/// (-infinity, +infinity).
pub fn alphabeta(
    tree: &mut Tree,
    id: NodeId,
    heuristic: Heuristic,
    weights: &Weights,
    noise: &mut Option<ChaCha8Rng>,
    telemetry: &mut Telemetry,
) -> (i64, Option<NodeId>) {
    alphabeta_bounded(tree, id, i64::MIN, i64::MAX, heuristic, weights, noise, telemetry)
}

#[allow(clippy::too_many_arguments)]
fn alphabeta_bounded(
    tree: &mut Tree,
    id: NodeId,
    mut alpha: i64,
    mut beta: i64,
    heuristic: Heuristic,
    weights: &Weights,
    noise: &mut Option<ChaCha8Rng>,
    telemetry: &mut Telemetry,
) -> (i64, Option<NodeId>) {
    telemetry.nodes_visited += 1;

    if tree.get(id).is_leaf() {
        let score = evaluate_leaf(tree, id, heuristic, weights, noise, telemetry);
        return (score, None);
    }

    let maximizing = tree.get(id).state.to_move() == Player::Attacker;
    let children = tree.get(id).children.clone();
    let total = children.len();

    let mut best: Option<(i64, NodeId)> = None;
    for (visited, child) in children.into_iter().enumerate() {
        let (value, _) =
            alphabeta_bounded(tree, child, alpha, beta, heuristic, weights, noise, telemetry);

        let improved = match best {
            None => true,
            Some((best_value, _)) => {
                if maximizing {
                    value > best_value
                } else {
                    value < best_value
                }
            }
        };
        if improved {
            best = Some((value, child));
        }

        if maximizing {
            alpha = alpha.max(best.expect("just set").0);
        } else {
            beta = beta.min(best.expect("just set").0);
        }
        if beta <= alpha {
            // Remaining siblings are never visited
            telemetry.pruned_subtrees += total - visited - 1;
            break;
        }
    }

    let (score, chosen) = best.expect("internal node has at least one child");
    tree.get_mut(id).score = Some(score);
    (score, Some(chosen))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;
    use crate::game::{GameState, Move};
    use crate::units::{Unit, UnitType};

    fn tiny_duel() -> GameState {
        let units = [
            (
                Coord::new(1, 1),
                Unit::new(Player::Attacker, UnitType::Virus),
            ),
            (Coord::new(0, 1), Unit::new(Player::Defender, UnitType::Ai)),
        ];
        GameState::from_units(2, Player::Attacker, &units)
    }

    fn run_minimax(state: GameState, depth: u32, heuristic: Heuristic) -> (i64, Option<Move>, Telemetry) {
        let weights = Weights::default();
        let mut tree = Tree::build(state, depth, None, &weights).unwrap();
        let mut telemetry = Telemetry::default();
        let (score, chosen) = minimax(
            &mut tree,
            NodeId::ROOT,
            heuristic,
            &weights,
            &mut None,
            &mut telemetry,
        );
        let mv = chosen.and_then(|c| tree.get(c).incoming_move);
        (score, mv, telemetry)
    }

    #[test]
    fn test_minimax_finds_the_kill() {
        let (score, mv, _) = run_minimax(tiny_duel(), 2, Heuristic::E0);
        assert!(matches!(mv, Some(Move::Attack { .. })));
        // Defender AI dead: 3 - 0
        assert_eq!(score, 3);
    }

    #[test]
    fn test_minimax_visits_whole_tree() {
        let weights = Weights::default();
        let mut tree = Tree::build(GameState::standard(), 2, None, &weights).unwrap();
        let total = tree.len();
        let leaves = tree.leaf_count();
        let mut telemetry = Telemetry::default();
        minimax(
            &mut tree,
            NodeId::ROOT,
            Heuristic::E1,
            &weights,
            &mut None,
            &mut telemetry,
        );
        assert_eq!(telemetry.nodes_visited, total);
        assert_eq!(telemetry.leaf_evals, leaves);
        assert_eq!(telemetry.pruned_subtrees, 0);
    }

    #[test]
    fn test_alphabeta_matches_minimax_value() {
        let weights = Weights::default();
        let mut plain = Tree::build(GameState::standard(), 2, None, &weights).unwrap();
        let mut pruned = plain.clone();
        pruned.order_siblings();

        let mut t1 = Telemetry::default();
        let (mm_score, mm_chosen) = minimax(
            &mut plain,
            NodeId::ROOT,
            Heuristic::E1,
            &weights,
            &mut None,
            &mut t1,
        );
        let mut t2 = Telemetry::default();
        let (ab_score, ab_chosen) = alphabeta(
            &mut pruned,
            NodeId::ROOT,
            Heuristic::E1,
            &weights,
            &mut None,
            &mut t2,
        );

        assert_eq!(mm_score, ab_score);
        let mm_move = mm_chosen.map(|c| plain.get(c).incoming_move);
        let ab_move = ab_chosen.map(|c| pruned.get(c).incoming_move);
        assert_eq!(mm_move, ab_move);
        assert!(t2.nodes_visited <= t1.nodes_visited);
    }

    #[test]
    fn test_internal_nodes_not_evaluated_directly() {
        let weights = Weights::default();
        let mut tree = Tree::build(GameState::standard(), 2, None, &weights).unwrap();
        let mut telemetry = Telemetry::default();
        minimax(
            &mut tree,
            NodeId::ROOT,
            Heuristic::E0,
            &weights,
            &mut None,
            &mut telemetry,
        );
        for &id in &telemetry.evaluated_leaves {
            assert!(tree.get(id).is_leaf());
        }
        assert_eq!(telemetry.evaluated_leaves.len(), telemetry.leaf_evals);
    }

    #[test]
    fn test_childless_internal_state_is_scored_as_leaf() {
        // Depth 1 tree where the root's children are depth-0 leaves
        let (score, mv, telemetry) = run_minimax(tiny_duel(), 1, Heuristic::E0);
        assert!(mv.is_some());
        assert_eq!(score, 3); // attack still wins at depth 1
        assert!(telemetry.leaf_evals > 0);
    }
}
