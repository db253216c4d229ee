//! Monte Carlo Tree Search (MCTS) over agent-generated programs.
//!
//! This crate provides the payload-agnostic search tree used by the runner:
//! an arena of nodes with visit statistics, UCT selection, batch selection
//! with pending-visit accounting, and additive backpropagation.
//!
//! # Overview
//!
//! Each search iteration has four phases:
//!
//! 1. **Selection**: pick up to `batch_size` nodes with UCT, checking each
//!    one out (`pending_visits += 1`) so the same batch does not pick it again
//! 2. **Dispatch**: simulate every selected node concurrently (runner crate)
//! 3. **Integration**: add the produced program as a child of its node and
//!    release the node
//! 4. **Backpropagation**: add the observed reward to every node from the
//!    new child up to the root
//!
//! # Usage
//!
//! ```rust
//! use mcts::{MctsConfig, MctsTree};
//!
//! let config = MctsConfig::default().with_batch_size(2).with_workers(2);
//! let mut tree: MctsTree<String> = MctsTree::empty();
//!
//! let selected = tree.select_batch(config.selections_per_iteration(), config.exploration_weight);
//! assert_eq!(selected, vec![tree.root(), tree.root()]);
//!
//! for node in selected {
//!     tree.release(node);
//!     let child = tree.add_child(node, "print('hello')".to_string());
//!     tree.backpropagate(child, 1.0);
//! }
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.get(tree.root()).visits, 2);
//! ```
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------+
//! |                    MctsTree<P>                        |
//! |  nodes: Vec<MctsNode<P>>   (arena, indexed by NodeId) |
//! |                                                       |
//! |  select_batch -> release -> add_child -> backpropagate|
//! +-------------------------------------------------------+
//! ```

pub mod config;
pub mod node;
pub mod tree;

// Re-export main types
pub use config::MctsConfig;
pub use node::{MctsNode, NodeId, NodePayload};
pub use tree::{MctsTree, TreeStats};
