//! MCTS tree node representation.
//!
//! Each node wraps the payload produced by one simulation (a candidate
//! program) and stores the visit statistics used for UCT selection.

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node holds.
///
/// A root seeded from a sampled program is `Expanded`; `Root` is the empty
/// root used when nothing could be sampled.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload<P> {
    Root,
    Expanded(P),
}

impl<P> NodePayload<P> {
    #[inline]
    pub fn program(&self) -> Option<&P> {
        match self {
            NodePayload::Root => None,
            NodePayload::Expanded(program) => Some(program),
        }
    }

    #[inline]
    pub fn is_empty_root(&self) -> bool {
        matches!(self, NodePayload::Root)
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode<P> {
    /// Parent node index (None for root)
    pub parent: Option<NodeId>,

    pub payload: NodePayload<P>,

    /// Children in creation order. Order matters for tie-breaks.
    pub children: Vec<NodeId>,

    /// Number of rewards backpropagated through this node
    pub visits: u32,

    /// Sum of rewards backpropagated through this node.
    /// Q = value / visits
    pub value: f64,

    /// Simulations currently in flight for this node. Advisory only:
    /// selection skips children with a non-zero count.
    pub pending_visits: u32,
}

impl<P> MctsNode<P> {
    /// Create a new root node.
    pub fn new_root(payload: NodePayload<P>) -> Self {
        Self {
            parent: None,
            payload,
            children: Vec::new(),
            visits: 0,
            value: 0.0,
            pending_visits: 0,
        }
    }

    /// Create a new child node holding `program`.
    pub fn new_child(parent: NodeId, program: P) -> Self {
        Self {
            parent: Some(parent),
            payload: NodePayload::Expanded(program),
            children: Vec::new(),
            visits: 0,
            value: 0.0,
            pending_visits: 0,
        }
    }

    #[inline]
    pub fn program(&self) -> Option<&P> {
        self.payload.program()
    }

    /// Average reward. Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value / self.visits as f64
        }
    }

    /// UCT score given the parent's visit count.
    ///
    /// UCT = Q + w * sqrt(2 * ln(N_parent) / N)
    ///
    /// Unvisited nodes, and nodes whose parent is unvisited or missing, score
    /// `+inf` so they are always tried before anything else.
    #[inline]
    pub fn uct_score(&self, parent_visits: Option<u32>, exploration_weight: f64) -> f64 {
        let parent_visits = match parent_visits {
            Some(n) if n > 0 => n,
            _ => return f64::INFINITY,
        };
        if self.visits == 0 {
            return f64::INFINITY;
        }

        let visits = self.visits as f64;
        let exploitation = self.value / visits;
        let exploration = (2.0 * (parent_visits as f64).ln() / visits).sqrt();
        exploitation + exploration_weight * exploration
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending_visits > 0
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_root() {
        let node: MctsNode<&str> = MctsNode::new_root(NodePayload::Root);

        assert!(node.parent.is_none());
        assert!(node.payload.is_empty_root());
        assert!(node.program().is_none());
        assert_eq!(node.visits, 0);
        assert_eq!(node.pending_visits, 0);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_new_child() {
        let node = MctsNode::new_child(NodeId(3), "code");

        assert_eq!(node.parent, Some(NodeId(3)));
        assert_eq!(node.program(), Some(&"code"));
    }

    #[test]
    fn test_mean_value() {
        let mut node = MctsNode::new_child(NodeId(0), ());
        assert!(node.mean_value().abs() < 1e-12);

        node.visits = 4;
        node.value = 2.0;
        assert!((node.mean_value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_uct_infinite_when_unvisited() {
        let node = MctsNode::new_child(NodeId(0), ());
        assert_eq!(node.uct_score(Some(10), 1.41), f64::INFINITY);
    }

    #[test]
    fn test_uct_infinite_without_parent_visits() {
        let mut node = MctsNode::new_child(NodeId(0), ());
        node.visits = 3;
        node.value = 1.5;

        assert_eq!(node.uct_score(None, 1.41), f64::INFINITY);
        assert_eq!(node.uct_score(Some(0), 1.41), f64::INFINITY);
    }

    #[test]
    fn test_uct_score() {
        let mut node = MctsNode::new_child(NodeId(0), ());
        node.visits = 10;
        node.value = 5.0;

        // 0.5 + 1.0 * sqrt(2 * ln(100) / 10) = 0.5 + 0.9597
        let uct = node.uct_score(Some(100), 1.0);
        assert!((uct - 1.4597).abs() < 1e-3);

        // No exploration weight leaves the plain average
        let greedy = node.uct_score(Some(100), 0.0);
        assert!((greedy - 0.5).abs() < 1e-12);
    }
}
