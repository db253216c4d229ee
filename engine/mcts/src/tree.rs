//! MCTS tree structure with arena allocation.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! The tree only grows: nodes are never removed during a search, so every
//! NodeId handed out stays valid for the lifetime of the tree.

use tracing::trace;

use crate::node::{MctsNode, NodeId, NodePayload};

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree<P> {
    /// Arena storing all nodes
    nodes: Vec<MctsNode<P>>,

    /// Root node index (always 0)
    root: NodeId,
}

impl<P> MctsTree<P> {
    /// Create a new tree whose root holds `payload`.
    pub fn new(payload: NodePayload<P>) -> Self {
        Self {
            nodes: vec![MctsNode::new_root(payload)],
            root: NodeId(0),
        }
    }

    /// Create a tree with an empty root.
    pub fn empty() -> Self {
        Self::new(NodePayload::Root)
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode<P> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode<P> {
        &mut self.nodes[id.index()]
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a child holding `program` under `parent_id`.
    /// Returns the new child's NodeId.
    pub fn add_child(&mut self, parent_id: NodeId, program: P) -> NodeId {
        let child_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MctsNode::new_child(parent_id, program));
        self.get_mut(parent_id).children.push(child_id);
        child_id
    }

    /// UCT score of a node, looking up its parent's visit count.
    pub fn uct_value(&self, node_id: NodeId, exploration_weight: f64) -> f64 {
        let node = self.get(node_id);
        let parent_visits = node.parent.map(|parent| self.get(parent).visits);
        node.uct_score(parent_visits, exploration_weight)
    }

    /// Select the child of `node_id` with the highest UCT score, ignoring
    /// children that are currently pending. The first maximum in insertion
    /// order wins ties.
    pub fn select_child(&self, node_id: NodeId, exploration_weight: f64) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;

        for &child_id in &self.get(node_id).children {
            if self.get(child_id).is_pending() {
                continue;
            }
            let score = self.uct_value(child_id, exploration_weight);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child_id, score)),
            }
        }

        best.map(|(id, _)| id)
    }

    /// Walk down from the root to the node that should be simulated next.
    ///
    /// - A root without children is selected itself.
    /// - If every child of the current node is pending, the current node is
    ///   selected, so an interior node can be simulated again while its
    ///   children are in flight.
    /// - A chosen child that was never visited is selected without
    ///   descending further.
    pub fn select_leaf(&self, exploration_weight: f64) -> NodeId {
        let mut current = self.root;
        if self.get(current).children.is_empty() {
            return current;
        }

        loop {
            match self.select_child(current, exploration_weight) {
                None => return current,
                Some(child_id) => {
                    if self.get(child_id).visits == 0 {
                        return child_id;
                    }
                    current = child_id;
                }
            }
        }
    }

    /// Select `count` nodes for one batch.
    ///
    /// Each selection is checked out (`pending_visits += 1`) before the next
    /// one is made, which keeps later selections in the same batch away
    /// from it.
    pub fn select_batch(&mut self, count: usize, exploration_weight: f64) -> Vec<NodeId> {
        let mut selected = Vec::with_capacity(count);
        for _ in 0..count {
            let node_id = self.select_leaf(exploration_weight);
            self.get_mut(node_id).pending_visits += 1;
            trace!(node = node_id.0, "Node checked out for simulation");
            selected.push(node_id);
        }
        selected
    }

    /// Return a node checked out by `select_batch`.
    pub fn release(&mut self, node_id: NodeId) {
        let node = self.get_mut(node_id);
        node.pending_visits = node.pending_visits.saturating_sub(1);
    }

    /// Backpropagate a reward from `leaf_id` up to and including the root.
    /// Plain additive accumulation on every node of the path.
    pub fn backpropagate(&mut self, leaf_id: NodeId, reward: f64) {
        let mut current = Some(leaf_id);
        while let Some(node_id) = current {
            let node = self.get_mut(node_id);
            node.visits += 1;
            node.value += reward;
            current = node.parent;
        }
    }

    /// Nodes from `node_id` up to the root, inclusive.
    pub fn path_to_root(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut path = vec![node_id];
        let mut current = self.get(node_id).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.get(parent).parent;
        }
        path
    }

    /// Number of edges between `node_id` and the root.
    pub fn depth(&self, node_id: NodeId) -> u32 {
        (self.path_to_root(node_id).len() - 1) as u32
    }

    /// Root child with the highest average value.
    /// Returns None if the root has no children.
    pub fn best_child(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in &self.get(self.root).children {
            let mean = self.get(child_id).mean_value();
            match best {
                Some((_, best_mean)) if mean <= best_mean => {}
                _ => best = Some((child_id, mean)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Get statistics about the tree for reporting.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visits,
            root_value: root.value,
            best_child_value: self.best_child().map(|id| self.get(id).mean_value()),
            max_depth: self.compute_max_depth(),
            pending_visits: self.nodes.iter().map(|n| n.pending_visits as u64).sum(),
        }
    }

    fn compute_max_depth(&self) -> u32 {
        // Children are always allocated after their parent, so one forward
        // pass over the arena sees every parent depth before its children.
        let mut depths = vec![0u32; self.nodes.len()];
        let mut max_depth = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                depths[index] = depths[parent.index()] + 1;
                max_depth = max_depth.max(depths[index]);
            }
        }
        max_depth
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    /// Sum of rewards at the root
    pub root_value: f64,
    /// Average value of the best root child, if any
    pub best_child_value: Option<f64>,
    pub max_depth: u32,
    pub pending_visits: u64,
}
