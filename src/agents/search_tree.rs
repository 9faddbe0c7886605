//! Arena-backed search tree used by the Monte Carlo tree search agent.
use rand::Rng;

use crate::board_game::GameError;
use crate::board_game::Result;
use crate::tictactoe::Board;

/// Handle to a node in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

impl NodeId {
    /// The root is always the first node allocated.
    pub const ROOT: NodeId = NodeId(0);
}

/// Moves at a node that have not been expanded into children yet. Shrinks as moves are popped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveSet {
    moves: Vec<usize>,
}

impl MoveSet {
    pub fn new(moves: Vec<usize>) -> MoveSet {
        MoveSet { moves }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn contains(&self, move_: usize) -> bool {
        self.moves.contains(&move_)
    }

    /// Remove and return a uniformly random move, or None if every move has been tried.
    pub fn pop_random(&mut self, rng: &mut impl Rng) -> Option<usize> {
        if self.moves.is_empty() {
            return None;
        }
        let i = rng.gen_range(0..self.moves.len());
        Some(self.moves.swap_remove(i))
    }
}

#[derive(Clone, Debug)]
/// Tree node for the Monte Carlo search tree.
pub struct TreeNode {
    // Position at this node, encoded so that the player about to move is P1.
    pub board: Board,
    // Move (cell index) that led here from the parent. None for the root.
    pub move_: Option<usize>,
    // Non-owning link used only when backpropagating.
    pub parent: Option<NodeId>,
    // In expansion order.
    pub children: Vec<NodeId>,
    // Legal moves not yet expanded.
    pub untried: MoveSet,
    pub visits: u32,
    // Sum of outcomes from the perspective of the player about to move here: +1 win, -1 loss.
    pub value_sum: i32,
}

impl TreeNode {
    pub fn new(
        board: Board,
        move_: Option<usize>,
        parent: Option<NodeId>,
        legal_moves: Vec<usize>,
    ) -> TreeNode {
        TreeNode {
            board,
            move_,
            parent,
            children: vec![],
            untried: MoveSet::new(legal_moves),
            visits: 0,
            value_sum: 0,
        }
    }

    /// A node is fully expanded once it has at least one child and no untried moves.
    pub fn is_fully_expanded(&self) -> bool {
        !self.children.is_empty() && self.untried.is_empty()
    }

    /// Average outcome for the player to move at this node, in [-1, 1].
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            return 0.;
        }
        self.value_sum as f64 / self.visits as f64
    }
}

/// All nodes of one search. Built fresh for every decision and dropped afterwards.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    pub fn new(root: TreeNode) -> SearchTree {
        SearchTree { nodes: vec![root] }
    }

    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> &TreeNode {
        self.get(NodeId::ROOT)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate `node` as the newest child of its parent.
    pub fn add_child(&mut self, parent: NodeId, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Pick the child with the highest UCB1 score. The first child wins ties. Unvisited children
    /// score infinity.
    pub fn select_child(&self, id: NodeId, exploration_constant: f64) -> Result<NodeId> {
        let node = self.get(id);
        let mut selected = None;
        let mut best_score = f64::NEG_INFINITY;
        for &child_id in node.children.iter() {
            let score = self.ucb(node, self.get(child_id), exploration_constant);
            if selected.is_none() || score > best_score {
                selected = Some(child_id);
                best_score = score;
            }
        }
        selected.ok_or(GameError::NoLegalMove)
    }

    /// UCB1 of `child` as seen by `parent`. The child's mean value is from the opponent's side,
    /// so it is inverted and rescaled to [0, 1] before the exploration term is added.
    fn ucb(&self, parent: &TreeNode, child: &TreeNode, exploration_constant: f64) -> f64 {
        if child.visits == 0 {
            return f64::INFINITY;
        }
        let q = 1. - (child.mean_value() + 1.) / 2.;
        q + exploration_constant
            * (f64::ln(parent.visits as f64) / child.visits as f64).sqrt()
    }

    /// Add `value` at `id` and walk to the root, negating it at every step up.
    pub fn backpropagate(&mut self, id: NodeId, value: i32) {
        let mut current = Some(id);
        let mut value = value;
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.value_sum += value;
            value = -value;
            current = node.parent;
        }
    }
}

#[cfg(test)]
fn leaf(parent: Option<NodeId>, move_: usize) -> TreeNode {
    TreeNode::new(Board::new(3), Some(move_), parent, vec![])
}

#[test]
fn test_move_set_pops_each_move_once() {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut moves = MoveSet::new(vec![0, 3, 5, 8]);
    let mut popped = vec![];
    while let Some(m) = moves.pop_random(&mut rng) {
        assert!(!moves.contains(m));
        popped.push(m);
    }
    popped.sort();
    assert_eq!(vec![0, 3, 5, 8], popped);
    assert!(moves.is_empty());
    assert_eq!(None, moves.pop_random(&mut rng));
}

#[test]
fn test_fully_expanded_needs_a_child() {
    let mut tree = SearchTree::new(TreeNode::new(Board::new(3), None, None, vec![]));
    assert!(!tree.root().is_fully_expanded());
    tree.add_child(NodeId::ROOT, leaf(Some(NodeId::ROOT), 0));
    assert!(tree.root().is_fully_expanded());
    assert_eq!(2, tree.len());
}

#[test]
fn test_backpropagate_alternates_sign() {
    let mut tree = SearchTree::new(TreeNode::new(Board::new(3), None, None, vec![]));
    let child = tree.add_child(NodeId::ROOT, leaf(Some(NodeId::ROOT), 4));
    let grandchild = tree.add_child(child, leaf(Some(child), 0));

    tree.backpropagate(grandchild, 1);
    assert_eq!((1, 1), (tree.get(grandchild).visits, tree.get(grandchild).value_sum));
    assert_eq!((1, -1), (tree.get(child).visits, tree.get(child).value_sum));
    assert_eq!((1, 1), (tree.root().visits, tree.root().value_sum));
}

#[test]
fn test_select_child_prefers_unvisited_then_first_on_tie() {
    let mut tree = SearchTree::new(TreeNode::new(Board::new(3), None, None, vec![]));
    let a = tree.add_child(NodeId::ROOT, leaf(Some(NodeId::ROOT), 0));
    let b = tree.add_child(NodeId::ROOT, leaf(Some(NodeId::ROOT), 1));
    tree.backpropagate(a, 0);
    assert_eq!(Ok(b), tree.select_child(NodeId::ROOT, 1.41));

    tree.backpropagate(b, 0);
    assert_eq!(Ok(a), tree.select_child(NodeId::ROOT, 1.41));
}

#[test]
fn test_select_child_favours_child_bad_for_opponent() {
    let mut tree = SearchTree::new(TreeNode::new(Board::new(3), None, None, vec![]));
    let a = tree.add_child(NodeId::ROOT, leaf(Some(NodeId::ROOT), 0));
    let b = tree.add_child(NodeId::ROOT, leaf(Some(NodeId::ROOT), 1));
    // the player to move at `a` won, the player to move at `b` lost
    tree.backpropagate(a, 1);
    tree.backpropagate(b, -1);
    assert_eq!(Ok(b), tree.select_child(NodeId::ROOT, 1.41));
}

#[test]
fn test_select_child_without_children_fails() {
    let tree = SearchTree::new(TreeNode::new(Board::new(3), None, None, vec![]));
    assert_eq!(
        Err(GameError::NoLegalMove),
        tree.select_child(NodeId::ROOT, 1.41)
    );
}
