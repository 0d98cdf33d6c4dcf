//! B+tree storage for table rows.
//!
//! # Structure
//!
//! The tree consists of:
//! - Internal nodes: `(child, separator)` entries plus a rightmost child, where
//!   each separator is the largest key in its child's subtree
//! - Leaf nodes: rows sorted by key, singly linked left to right for scans
//!
//! The root is always page 0. Deleting rows empties leaves but never merges
//! them or frees their pages.

mod cursor;
mod node;
mod render;
mod tree;
mod verify;

pub use cursor::Cursor;
pub use node::{
    INTERNAL_CELL_SIZE, INTERNAL_HEADER_SIZE, INTERNAL_MAX_KEYS, InternalNode, LEAF_CELL_SIZE,
    LEAF_HEADER_SIZE, LEAF_MAX_CELLS, LeafNode, NO_NEXT_LEAF, NODE_HEADER_SIZE, Node, NodeError,
    NodeHeader, NodeType,
};
pub use tree::{BTree, NodeLimits, ROOT_PAGE, TreeError};
pub use verify::{InvariantViolation, TreeStats};
