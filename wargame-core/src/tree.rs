//! Explicit search tree with arena allocation
//!
//! Every node is owned by the arena and referenced by index; parent to
//! child is the only link direction, so there are no cycles and no
//! back-references. A tree is built fresh for every search and discarded
//! once the chosen root move has been extracted.

use crate::eval::{order_estimate, Weights};
use crate::game::{GameError, GameState, Move};
use crate::units::Player;
use std::time::Instant;

/// Node identifier (index into the arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// Game state at this node, never mutated after construction.
    pub state: GameState,
    /// Move that produced this state from the parent (None for the root).
    pub incoming_move: Option<Move>,
    /// Propagated evaluation, filled bottom-up during search.
    pub score: Option<i64>,
    /// Cached static estimate, the sibling-ordering key for alpha-beta.
    pub estimate: i64,
    /// Position among siblings at creation time; the ordering tie-break.
    pub insertion_index: usize,
    /// Children in traversal order (empty until expanded).
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The search tree: arena storage plus expansion bookkeeping.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    /// Number of nodes that received children.
    expanded_internal: usize,
    /// Set when the time budget stopped expansion early.
    budget_exceeded: bool,
}

impl Tree {
    // ========================================================================
    // BUILD
    // ========================================================================

    /// Recursively expand `root_state` into a tree of at most `max_depth`
    /// plies. Depth 0 or a terminal state makes a leaf. The deadline is
    /// checked at every expansion step below the root: once exceeded, no
    /// further node is expanded and the tree is flagged as partial. The
    /// root itself always expands so a best-so-far move exists.
    pub fn build(
        root_state: GameState,
        max_depth: u32,
        deadline: Option<Instant>,
        weights: &Weights,
    ) -> Result<Self, GameError> {
        let estimate = order_estimate(&root_state, weights);
        let root = TreeNode {
            state: root_state,
            incoming_move: None,
            score: None,
            estimate,
            insertion_index: 0,
            children: Vec::new(),
        };
        let mut tree = Self {
            nodes: vec![root],
            expanded_internal: 0,
            budget_exceeded: false,
        };
        tree.expand_recursive(NodeId::ROOT, max_depth, deadline, weights, true)?;
        Ok(tree)
    }

    fn expand_recursive(
        &mut self,
        id: NodeId,
        depth: u32,
        deadline: Option<Instant>,
        weights: &Weights,
        is_root: bool,
    ) -> Result<(), GameError> {
        if depth == 0 || self.nodes[id.0].state.is_terminal() {
            return Ok(());
        }

        if !is_root {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    self.budget_exceeded = true;
                    return Ok(());
                }
            }
        }

        let candidates = self.nodes[id.0].state.move_candidates();
        if candidates.is_empty() {
            // No continuation: leaf even above depth 0
            return Ok(());
        }

        self.expanded_internal += 1;
        let mut child_ids = Vec::with_capacity(candidates.len());
        for (insertion_index, mv) in candidates.into_iter().enumerate() {
            let child_state = self.nodes[id.0].state.apply(mv)?;
            let estimate = order_estimate(&child_state, weights);
            let child_id = NodeId(self.nodes.len());
            self.nodes.push(TreeNode {
                state: child_state,
                incoming_move: Some(mv),
                score: None,
                estimate,
                insertion_index,
                children: Vec::new(),
            });
            child_ids.push(child_id);
        }
        self.nodes[id.0].children = child_ids.clone();

        for child_id in child_ids {
            if self.budget_exceeded {
                break;
            }
            self.expand_recursive(child_id, depth - 1, deadline, weights, false)?;
        }
        Ok(())
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    /// Total node count.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn budget_exceeded(&self) -> bool {
        self.budget_exceeded
    }

    /// Leaf count (nodes with no children).
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Average children per expanded internal node.
    pub fn branching_factor(&self) -> f64 {
        if self.expanded_internal == 0 {
            0.0
        } else {
            (self.nodes.len() - 1) as f64 / self.expanded_internal as f64
        }
    }

    // ========================================================================
    // TRAVERSAL ORDER
    // ========================================================================

    /// Reorder siblings so the mover's best static estimate comes first:
    /// descending where the parent's player to move maximizes (Attacker),
    /// ascending where it minimizes, ties kept in insertion order. The
    /// root's children always stay in generation order so root tie-breaks
    /// resolve identically for minimax and alpha-beta.
    pub fn order_siblings(&mut self) {
        for id in 1..self.nodes.len() {
            self.order_children_of(NodeId(id));
        }
    }

    fn order_children_of(&mut self, id: NodeId) {
        if self.nodes[id.0].children.len() < 2 {
            return;
        }
        let maximizing = self.nodes[id.0].state.to_move() == Player::Attacker;
        let mut children = std::mem::take(&mut self.nodes[id.0].children);
        children.sort_by_key(|&child| {
            let node = &self.nodes[child.0];
            let key = if maximizing { -node.estimate } else { node.estimate };
            (key, node.insertion_index)
        });
        self.nodes[id.0].children = children;
    }
}

// ============================================================================
// TESTS
// ============================================================================
