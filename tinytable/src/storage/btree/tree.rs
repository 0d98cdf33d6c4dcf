//! B+tree operations over pager-owned pages.
//!
//! The tree stores one [`Row`] per leaf cell, keyed by `Row::key`. Internal
//! separators are subtree maxima, so a search descends into the first child
//! whose separator is `>= key`.
//!
//! The root always lives at [`ROOT_PAGE`]. When it splits, its contents move
//! to a freshly allocated page and page 0 is rewritten as the new internal
//! root, so callers never have to track a moving root.

#![allow(clippy::cast_possible_truncation)]

use crate::storage::btree::cursor::Cursor;
use crate::storage::btree::node::{
    INTERNAL_MAX_KEYS, InternalNode, InternalNodeMut, LEAF_MAX_CELLS, LeafNode, LeafNodeMut, Node,
    NodeError, NodeHeader, NodeType,
};
use crate::storage::btree::verify::InvariantViolation;
use crate::storage::file::FileError;
use crate::storage::page::PageId;
use crate::storage::pager::Pager;
use crate::types::Row;

/// Page holding the root node.
pub const ROOT_PAGE: PageId = 0;

/// Split thresholds for leaf and internal nodes.
///
/// These only decide when a node splits; the page layout is the same for any
/// limits, so a file written with one set of limits can be opened with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLimits {
    pub leaf_max_cells: usize,
    pub internal_max_keys: usize,
}

impl NodeLimits {
    /// Smallest limit that still lets a split leave both halves non-empty.
    pub const MIN: usize = 2;

    #[must_use]
    pub const fn new(leaf_max_cells: usize, internal_max_keys: usize) -> Self {
        Self {
            leaf_max_cells,
            internal_max_keys,
        }
    }

    /// Whether both limits are between [`Self::MIN`] and the page capacity.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.leaf_max_cells >= Self::MIN
            && self.leaf_max_cells <= LEAF_MAX_CELLS
            && self.internal_max_keys >= Self::MIN
            && self.internal_max_keys <= INTERNAL_MAX_KEYS
    }
}

impl Default for NodeLimits {
    fn default() -> Self {
        Self::new(LEAF_MAX_CELLS, INTERNAL_MAX_KEYS)
    }
}

/// A B+tree rooted at page 0 of a pager.
pub struct BTree<'a> {
    pub(super) pager: &'a mut Pager,
    limits: NodeLimits,
}

impl<'a> BTree<'a> {
    pub const fn new(pager: &'a mut Pager, limits: NodeLimits) -> Self {
        Self { pager, limits }
    }

    /// Write an empty root leaf to page 0 if the file has no pages yet.
    ///
    /// Returns whether a root was created.
    pub fn bootstrap(pager: &mut Pager) -> Result<bool, TreeError> {
        if pager.num_pages() > 0 {
            return Ok(false);
        }

        let page_id = pager.allocate()?;
        debug_assert_eq!(page_id, ROOT_PAGE);
        let mut root = LeafNodeMut::init(pager.fetch_mut(page_id)?);
        root.set_root(true);

        tracing::debug!("initialized empty root leaf");
        Ok(true)
    }

    /// Position a cursor at `key`, or at the slot where it would be inserted.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>, TreeError> {
        let (page_id, Ok(slot) | Err(slot)) = self.locate(key)?;
        Ok(Cursor::at(self.pager, page_id, slot))
    }

    /// Cursor at the first row in key order, or at end of table if empty.
    pub fn start(&mut self) -> Result<Cursor<'_>, TreeError> {
        let mut cursor = self.find(0)?;
        cursor.settle()?;
        Ok(cursor)
    }

    /// Insert a row. A key that is already present is rejected.
    pub fn insert(&mut self, row: &Row) -> Result<(), TreeError> {
        let (leaf_page, slot) = self.locate(row.key)?;
        let Err(slot) = slot else {
            return Err(TreeError::DuplicateKey(row.key));
        };

        let count = LeafNode::from_page(self.pager.fetch(leaf_page)?)?.num_cells();
        if count < self.limits.leaf_max_cells {
            LeafNodeMut::from_page(self.pager.fetch_mut(leaf_page)?)?.insert_cell(slot, row)?;
            return Ok(());
        }

        self.split_leaf_and_insert(leaf_page, slot, row)
    }

    /// Remove every row matching `predicate`, scanning the whole leaf chain.
    ///
    /// Emptied leaves stay linked and ancestors keep their old separators.
    /// Returns the number of rows removed.
    pub fn delete_matching<F>(&mut self, mut predicate: F) -> Result<usize, TreeError>
    where
        F: FnMut(&Row) -> bool,
    {
        let mut cursor = self.start()?;
        let mut removed = 0;

        while let Some(row) = cursor.value()? {
            if predicate(&row) {
                cursor.remove()?;
                removed += 1;
            } else {
                cursor.advance()?;
            }
        }

        tracing::debug!("deleted {removed} rows");
        Ok(removed)
    }

    /// Largest key in the tree, or `None` if it holds no rows.
    pub fn max_key(&mut self) -> Result<Option<u32>, TreeError> {
        self.subtree_max_key(ROOT_PAGE, 1)
    }

    /// Largest key stored under `page_id`.
    ///
    /// Follows the rightmost child first; if deletions have emptied that
    /// subtree, falls back to its left siblings.
    fn subtree_max_key(&mut self, page_id: PageId, depth: usize) -> Result<Option<u32>, TreeError> {
        let children = match Node::from_page(self.pager.fetch(page_id)?)? {
            Node::Leaf(leaf) => return Ok(leaf.max_key()),
            Node::Internal(node) => node.children(),
        };

        for child in children.into_iter().rev() {
            let child = self.child_page(page_id, child, depth + 1)?;
            if let Some(max) = self.subtree_max_key(child, depth + 1)? {
                return Ok(Some(max));
            }
        }
        Ok(None)
    }

    /// Descend from the root to the leaf that owns `key`.
    ///
    /// Returns the leaf page and the result of its slot search.
    fn locate(&mut self, key: u32) -> Result<(PageId, Result<usize, usize>), TreeError> {
        let mut page_id = ROOT_PAGE;
        let mut depth = 1;
        loop {
            let child = match Node::from_page(self.pager.fetch(page_id)?)? {
                Node::Leaf(leaf) => return Ok((page_id, leaf.find_slot(key))),
                Node::Internal(node) => node.child(node.find_child_index(key)),
            };
            depth += 1;
            page_id = self.child_page(page_id, child, depth)?;
        }
    }

    /// Check a child pointer read from `parent` before following it.
    ///
    /// The root is never a child and every child is an allocated page. A
    /// path from the root can't be longer than the number of pages, so a
    /// deeper `depth` means the pointers loop.
    pub(super) fn child_page(
        &self,
        parent: PageId,
        child: PageId,
        depth: usize,
    ) -> Result<PageId, TreeError> {
        let num_pages = self.pager.num_pages();
        if child == ROOT_PAGE || child >= num_pages {
            return Err(InvariantViolation::DanglingChild { parent, child }.into());
        }
        if depth > num_pages as usize {
            return Err(InvariantViolation::Cycle { page: child }.into());
        }
        Ok(child)
    }

    /// Split a full leaf, placing `row` at `slot` while redistributing.
    fn split_leaf_and_insert(
        &mut self,
        old_page: PageId,
        slot: usize,
        row: &Row,
    ) -> Result<(), TreeError> {
        let (mut left_rows, next_leaf, parent, is_root) = {
            let leaf = LeafNode::from_page(self.pager.fetch(old_page)?)?;
            (leaf.rows()?, leaf.next_leaf(), leaf.parent(), leaf.is_root())
        };

        left_rows.insert(slot, row.clone());
        // A full leaf holds at least two cells, so both halves are non-empty
        let right_rows = left_rows.split_off(left_rows.len() / 2);
        let left_max = left_rows[left_rows.len() - 1].key;
        let right_max = right_rows[right_rows.len() - 1].key;

        let new_page = self.pager.allocate()?;
        {
            let mut right = LeafNodeMut::init(self.pager.fetch_mut(new_page)?);
            right.set_parent(parent);
            right.set_next_leaf(next_leaf);
            right.write_rows(&right_rows)?;
        }
        {
            let mut left = LeafNodeMut::from_page(self.pager.fetch_mut(old_page)?)?;
            left.write_rows(&left_rows)?;
            left.set_next_leaf(new_page);
        }

        tracing::debug!(
            "split leaf {old_page}: {} cells kept, {} moved to page {new_page} (max {right_max})",
            left_rows.len(),
            right_rows.len()
        );

        if is_root {
            self.create_new_root(left_max, new_page)
        } else {
            self.insert_into_parent(parent, old_page, left_max, new_page)
        }
    }

    /// Record a split of `child` in `parent`.
    ///
    /// `child` keeps its position and gets `child_max` as its separator; the
    /// new `sibling` goes immediately to its right, inheriting the old
    /// separator (or the rightmost slot).
    fn insert_into_parent(
        &mut self,
        parent: PageId,
        child: PageId,
        child_max: u32,
        sibling: PageId,
    ) -> Result<(), TreeError> {
        let (index, num_keys, grandparent, is_root) = {
            let node = InternalNode::from_page(self.pager.fetch(parent)?)?;
            let index = node
                .child_index_of(child)
                .ok_or(InvariantViolation::MissingChild { parent, child })?;
            (index, node.num_keys(), node.parent(), node.is_root())
        };

        if num_keys < self.limits.internal_max_keys {
            let mut node = InternalNodeMut::from_page(self.pager.fetch_mut(parent)?)?;
            if index == num_keys {
                node.insert_entry(index, child, child_max)?;
                node.set_right_child(sibling);
            } else {
                let old_separator = node.as_ref().key(index);
                node.set_key(index, child_max);
                node.insert_entry(index + 1, sibling, old_separator)?;
            }
            return Ok(());
        }

        let (mut entries, mut right_child) = {
            let node = InternalNode::from_page(self.pager.fetch(parent)?)?;
            (node.entries(), node.right_child())
        };
        if index == num_keys {
            entries.push((child, child_max));
            right_child = sibling;
        } else {
            let old_separator = entries[index].1;
            entries[index].1 = child_max;
            entries.insert(index + 1, (sibling, old_separator));
        }

        // Left keeps the lower half; the entry after it is promoted into the
        // parent and its child becomes the left node's rightmost child.
        let mut right_entries = entries.split_off(entries.len() / 2);
        let (promoted_child, promoted_key) = right_entries.remove(0);

        let new_page = self.pager.allocate()?;
        {
            let mut right = InternalNodeMut::init(self.pager.fetch_mut(new_page)?);
            right.set_parent(grandparent);
            right.write_entries(&right_entries, right_child)?;
        }
        InternalNodeMut::from_page(self.pager.fetch_mut(parent)?)?
            .write_entries(&entries, promoted_child)?;

        for (moved, _) in right_entries {
            self.update_parent_pointer(moved, new_page)?;
        }
        self.update_parent_pointer(right_child, new_page)?;

        tracing::debug!(
            "split internal {parent}: {} keys kept, separator {promoted_key}, new page {new_page}",
            entries.len()
        );

        if is_root {
            self.create_new_root(promoted_key, new_page)
        } else {
            self.insert_into_parent(grandparent, parent, promoted_key, new_page)
        }
    }

    /// Grow the tree by one level after the root split.
    ///
    /// The old root's contents move to a new left page; page 0 becomes an
    /// internal node with that page and `right` as its two children.
    fn create_new_root(&mut self, left_max: u32, right: PageId) -> Result<(), TreeError> {
        let left = self.pager.allocate()?;
        let old_root = self.pager.fetch(ROOT_PAGE)?.clone();
        let page = self.pager.fetch_mut(left)?;
        *page = old_root;

        let moved_children = match NodeHeader::from_page(page)?.node_type {
            NodeType::Leaf => {
                let mut leaf = LeafNodeMut::from_page(page)?;
                leaf.set_root(false);
                leaf.set_parent(ROOT_PAGE);
                Vec::new()
            }
            NodeType::Internal => {
                let mut node = InternalNodeMut::from_page(page)?;
                node.set_root(false);
                node.set_parent(ROOT_PAGE);
                node.as_ref().children()
            }
        };
        for child in moved_children {
            self.update_parent_pointer(child, left)?;
        }

        let mut root = InternalNodeMut::init(self.pager.fetch_mut(ROOT_PAGE)?);
        root.set_root(true);
        root.write_entries(&[(left, left_max)], right)?;
        self.update_parent_pointer(right, ROOT_PAGE)?;

        tracing::debug!("new root: left page {left} (max {left_max}), right page {right}");
        Ok(())
    }

    /// Point `page_id`'s parent field at `new_parent`.
    fn update_parent_pointer(
        &mut self,
        page_id: PageId,
        new_parent: PageId,
    ) -> Result<(), TreeError> {
        let page = self.pager.fetch_mut(page_id)?;
        let mut header = NodeHeader::from_page(page)?;
        header.parent_page = new_parent;
        header.write_to_page(page);
        Ok(())
    }
}

/// Errors that can occur during B+tree operations.
#[derive(Debug)]
pub enum TreeError {
    /// File I/O error.
    File(FileError),
    /// Node error.
    Node(NodeError),
    /// The key is already present.
    DuplicateKey(u32),
    /// The tree structure is inconsistent.
    Invariant(InvariantViolation),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(e) => write!(f, "file error: {e}"),
            Self::Node(e) => write!(f, "node error: {e}"),
            Self::DuplicateKey(key) => write!(f, "duplicate key {key}"),
            Self::Invariant(e) => write!(f, "corrupt tree: {e}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::File(e) => Some(e),
            Self::Node(e) => Some(e),
            Self::Invariant(e) => Some(e),
            Self::DuplicateKey(_) => None,
        }
    }
}

impl From<FileError> for TreeError {
    fn from(e: FileError) -> Self {
        Self::File(e)
    }
}

impl From<NodeError> for TreeError {
    fn from(e: NodeError) -> Self {
        Self::Node(e)
    }
}

impl From<InvariantViolation> for TreeError {
    fn from(e: InvariantViolation) -> Self {
        Self::Invariant(e)
    }
}
