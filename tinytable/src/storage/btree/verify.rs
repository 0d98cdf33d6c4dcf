//! Structural checks over a whole tree.
//!
//! Deletions never touch internal nodes, so a separator may be larger than
//! what its subtree still holds. The checker treats separators as upper
//! bounds and reports how many of them are stale instead of failing.

use std::collections::HashSet;

use crate::storage::btree::node::{NO_NEXT_LEAF, Node};
use crate::storage::btree::tree::{BTree, ROOT_PAGE, TreeError};
use crate::storage::page::PageId;

/// Shape of a tree that passed [`BTree::check_invariants`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Levels from the root down to the leaves; a lone root leaf has height 1.
    pub height: usize,
    pub leaf_count: usize,
    pub internal_count: usize,
    pub row_count: usize,
    /// Separators larger than the real maximum of their subtree.
    pub stale_separators: usize,
}

/// A broken structural rule, naming the page where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Keys or separators are not strictly ascending.
    UnsortedKeys { page: PageId },
    /// A key lies outside the range its ancestors' separators allow.
    KeyOutOfRange { page: PageId, key: u32 },
    /// A node's parent field does not name the node referencing it.
    ParentMismatch {
        page: PageId,
        expected: PageId,
        found: PageId,
    },
    /// The root flag is missing on page 0 or set on another page.
    RootFlag { page: PageId },
    /// Leaves sit at different depths.
    UnevenDepth {
        page: PageId,
        depth: usize,
        expected: usize,
    },
    /// Following `next_leaf` does not visit the leaves in tree order.
    BrokenLeafChain { page: PageId },
    /// A page is reachable twice.
    Cycle { page: PageId },
    /// A child pointer names the root or a page that was never allocated.
    DanglingChild { parent: PageId, child: PageId },
    /// A child being split is not referenced by its parent.
    MissingChild { parent: PageId, child: PageId },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsortedKeys { page } => write!(f, "page {page}: keys not ascending"),
            Self::KeyOutOfRange { page, key } => {
                write!(f, "page {page}: key {key} outside separator range")
            }
            Self::ParentMismatch {
                page,
                expected,
                found,
            } => write!(f, "page {page}: parent is {found}, expected {expected}"),
            Self::RootFlag { page } => write!(f, "page {page}: wrong root flag"),
            Self::UnevenDepth {
                page,
                depth,
                expected,
            } => write!(f, "page {page}: leaf at depth {depth}, expected {expected}"),
            Self::BrokenLeafChain { page } => write!(f, "page {page}: leaf chain out of order"),
            Self::Cycle { page } => write!(f, "page {page}: reachable more than once"),
            Self::DanglingChild { parent, child } => {
                write!(f, "page {parent}: child pointer {child} leads outside the tree")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "page {parent}: child {child} not found")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Walk state shared across the recursive descent.
#[derive(Default)]
struct Walk {
    stats: TreeStats,
    visited: HashSet<PageId>,
    /// Leaves in left-to-right tree order.
    leaves: Vec<PageId>,
    /// Depth of the first leaf reached.
    leaf_depth: Option<usize>,
}

/// Allowed key range for a subtree: `(lower, upper]`.
#[derive(Clone, Copy)]
struct Bounds {
    lower: Option<u32>,
    upper: Option<u32>,
}

impl Bounds {
    fn contains(self, key: u32) -> bool {
        self.lower.is_none_or(|lower| key > lower) && self.upper.is_none_or(|upper| key <= upper)
    }
}

impl BTree<'_> {
    /// Check every structural rule of the tree and collect its statistics.
    ///
    /// Returns the first violation found as [`TreeError::Invariant`].
    pub fn check_invariants(&mut self) -> Result<TreeStats, TreeError> {
        let mut walk = Walk::default();
        let unbounded = Bounds {
            lower: None,
            upper: None,
        };
        self.check_node(ROOT_PAGE, ROOT_PAGE, 1, unbounded, &mut walk)?;
        self.check_leaf_chain(&walk.leaves)?;

        walk.stats.height = walk.leaf_depth.unwrap_or(1);
        Ok(walk.stats)
    }

    /// Check the subtree at `page_id` and return its largest key.
    fn check_node(
        &mut self,
        page_id: PageId,
        parent: PageId,
        depth: usize,
        bounds: Bounds,
        walk: &mut Walk,
    ) -> Result<Option<u32>, TreeError> {
        if !walk.visited.insert(page_id) {
            return Err(InvariantViolation::Cycle { page: page_id }.into());
        }

        let page = self.pager.fetch(page_id)?;
        let node = Node::from_page(page)?;
        let header = node.header()?;

        if header.is_root != (page_id == ROOT_PAGE) {
            return Err(InvariantViolation::RootFlag { page: page_id }.into());
        }
        if page_id != ROOT_PAGE && header.parent_page != parent {
            return Err(InvariantViolation::ParentMismatch {
                page: page_id,
                expected: parent,
                found: header.parent_page,
            }
            .into());
        }

        match node {
            Node::Leaf(leaf) => {
                let keys: Vec<u32> = (0..leaf.num_cells()).map(|slot| leaf.key(slot)).collect();
                // Decoding every cell catches corrupt values too
                leaf.rows()?;
                check_keys(page_id, &keys, bounds)?;

                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(InvariantViolation::UnevenDepth {
                            page: page_id,
                            depth,
                            expected,
                        }
                        .into());
                    }
                    Some(_) => {}
                }

                walk.leaves.push(page_id);
                walk.stats.leaf_count += 1;
                walk.stats.row_count += keys.len();
                Ok(keys.last().copied())
            }
            Node::Internal(internal) => {
                let entries = internal.entries();
                let right_child = internal.right_child();
                let separators: Vec<u32> = entries.iter().map(|&(_, key)| key).collect();
                check_keys(page_id, &separators, bounds)?;
                walk.stats.internal_count += 1;

                let mut lower = bounds.lower;
                let mut subtree_max = None;
                for (child, separator) in entries {
                    let child_bounds = Bounds {
                        lower,
                        upper: Some(separator),
                    };
                    let child = self.child_page(page_id, child, depth + 1)?;
                    let child_max = self.check_node(child, page_id, depth + 1, child_bounds, walk)?;
                    if child_max != Some(separator) {
                        walk.stats.stale_separators += 1;
                    }
                    subtree_max = child_max.or(subtree_max);
                    lower = Some(separator);
                }

                let right_bounds = Bounds {
                    lower,
                    upper: bounds.upper,
                };
                let right_child = self.child_page(page_id, right_child, depth + 1)?;
                let right_max =
                    self.check_node(right_child, page_id, depth + 1, right_bounds, walk)?;
                Ok(right_max.or(subtree_max))
            }
        }
    }

    /// Following `next_leaf` from the leftmost leaf must visit `leaves` in order.
    fn check_leaf_chain(&mut self, leaves: &[PageId]) -> Result<(), TreeError> {
        for (index, &page_id) in leaves.iter().enumerate() {
            let expected_next = leaves.get(index + 1).copied().unwrap_or(NO_NEXT_LEAF);
            let next = match Node::from_page(self.pager.fetch(page_id)?)? {
                Node::Leaf(leaf) => leaf.next_leaf(),
                Node::Internal(_) => {
                    return Err(InvariantViolation::BrokenLeafChain { page: page_id }.into());
                }
            };
            if next != expected_next {
                return Err(InvariantViolation::BrokenLeafChain { page: page_id }.into());
            }
        }
        Ok(())
    }
}

/// Keys must be strictly ascending and inside `bounds`.
fn check_keys(page: PageId, keys: &[u32], bounds: Bounds) -> Result<(), InvariantViolation> {
    if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(InvariantViolation::UnsortedKeys { page });
    }
    if let Some(&key) = keys.iter().find(|&&key| !bounds.contains(key)) {
        return Err(InvariantViolation::KeyOutOfRange { page, key });
    }
    Ok(())
}
