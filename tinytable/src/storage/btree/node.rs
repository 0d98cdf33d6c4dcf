//! B+tree node layout and typed page accessors.
//!
//! Every page holds one node. Nodes are never parsed into owned structures;
//! instead [`LeafNode`] / [`InternalNode`] borrow a [`Page`] and read fields in
//! place, and the `*Mut` variants write them in place.
//!
//! Common header (6 bytes):
//! - `node_type`: 1 byte (0 = internal, 1 = leaf)
//! - `is_root`: 1 byte
//! - `parent_page`: 4 bytes
//!
//! Leaf header adds `num_cells` (4 bytes) and `next_leaf` (4 bytes, 0 if none),
//! followed by fixed-size cells holding one serialized [`Row`] each.
//!
//! Internal header adds `num_keys` (4 bytes) and `right_child` (4 bytes),
//! followed by `(child, key)` entries. `key` is the largest key stored in
//! `child`'s subtree; `right_child` holds everything larger.

#![allow(clippy::cast_possible_truncation)]

use crate::storage::page::{PAGE_SIZE, Page, PageId};
use crate::types::{ROW_SIZE, Row, RowError};

const NODE_TYPE_OFFSET: usize = 0;
const IS_ROOT_OFFSET: usize = 1;
const PARENT_OFFSET: usize = 2;

/// Size of the header shared by both node kinds.
pub const NODE_HEADER_SIZE: usize = 6;

const LEAF_NUM_CELLS_OFFSET: usize = NODE_HEADER_SIZE;
const LEAF_NEXT_LEAF_OFFSET: usize = LEAF_NUM_CELLS_OFFSET + 4;

/// Size of a leaf node header.
pub const LEAF_HEADER_SIZE: usize = LEAF_NEXT_LEAF_OFFSET + 4;

/// A leaf cell is exactly one serialized row; the row key is the cell key.
pub const LEAF_CELL_SIZE: usize = ROW_SIZE;

/// Maximum number of cells in a leaf node.
pub const LEAF_MAX_CELLS: usize = (PAGE_SIZE - LEAF_HEADER_SIZE) / LEAF_CELL_SIZE;

const INTERNAL_NUM_KEYS_OFFSET: usize = NODE_HEADER_SIZE;
const INTERNAL_RIGHT_CHILD_OFFSET: usize = INTERNAL_NUM_KEYS_OFFSET + 4;

/// Size of an internal node header.
pub const INTERNAL_HEADER_SIZE: usize = INTERNAL_RIGHT_CHILD_OFFSET + 4;

/// Internal entry size: child pointer (4 bytes) + key (4 bytes).
pub const INTERNAL_CELL_SIZE: usize = 8;

/// Maximum number of keys in an internal node.
pub const INTERNAL_MAX_KEYS: usize = (PAGE_SIZE - INTERNAL_HEADER_SIZE) / INTERNAL_CELL_SIZE;

/// `next_leaf` value marking the last leaf. Page 0 is always the root, so it
/// can never be a successor.
pub const NO_NEXT_LEAF: PageId = 0;

/// Node type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl TryFrom<u8> for NodeType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::Leaf),
            _ => Err(value),
        }
    }
}

/// Header information shared by both node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub is_root: bool,
    /// Parent page. Meaningless for the root.
    pub parent_page: PageId,
}

impl NodeHeader {
    /// Read a node header from a page.
    pub fn from_page(page: &Page) -> Result<Self, NodeError> {
        let node_type = NodeType::try_from(page.read_u8(NODE_TYPE_OFFSET))
            .map_err(NodeError::InvalidNodeType)?;

        Ok(Self {
            node_type,
            is_root: page.read_u8(IS_ROOT_OFFSET) != 0,
            parent_page: page.read_u32(PARENT_OFFSET),
        })
    }

    /// Write a node header to a page.
    pub fn write_to_page(&self, page: &mut Page) {
        page.write_u8(NODE_TYPE_OFFSET, self.node_type as u8);
        page.write_u8(IS_ROOT_OFFSET, u8::from(self.is_root));
        page.write_u32(PARENT_OFFSET, self.parent_page);
    }
}

/// A parsed view of a page, tagged by node kind.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Leaf(LeafNode<'a>),
    Internal(InternalNode<'a>),
}

impl<'a> Node<'a> {
    /// Interpret a page according to its header tag.
    pub fn from_page(page: &'a Page) -> Result<Self, NodeError> {
        match NodeHeader::from_page(page)?.node_type {
            NodeType::Leaf => LeafNode::from_page(page).map(Self::Leaf),
            NodeType::Internal => InternalNode::from_page(page).map(Self::Internal),
        }
    }

    /// The node's header.
    pub fn header(&self) -> Result<NodeHeader, NodeError> {
        match self {
            Self::Leaf(leaf) => NodeHeader::from_page(leaf.page),
            Self::Internal(node) => NodeHeader::from_page(node.page),
        }
    }
}

fn leaf_cell_offset(slot: usize) -> usize {
    LEAF_HEADER_SIZE + slot * LEAF_CELL_SIZE
}

fn internal_cell_offset(index: usize) -> usize {
    INTERNAL_HEADER_SIZE + index * INTERNAL_CELL_SIZE
}

/// Read-only view of a leaf node.
#[derive(Debug, Clone, Copy)]
pub struct LeafNode<'a> {
    page: &'a Page,
}

impl<'a> LeafNode<'a> {
    /// Borrow a page as a leaf, validating its tag and cell count.
    pub fn from_page(page: &'a Page) -> Result<Self, NodeError> {
        let header = NodeHeader::from_page(page)?;
        if header.node_type != NodeType::Leaf {
            return Err(NodeError::WrongNodeType);
        }
        let count = page.read_u32(LEAF_NUM_CELLS_OFFSET) as usize;
        if count > LEAF_MAX_CELLS {
            return Err(NodeError::CountOverCapacity {
                count,
                capacity: LEAF_MAX_CELLS,
            });
        }
        Ok(Self { page })
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.page.read_u8(IS_ROOT_OFFSET) != 0
    }

    #[must_use]
    pub fn parent(&self) -> PageId {
        self.page.read_u32(PARENT_OFFSET)
    }

    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.page.read_u32(LEAF_NUM_CELLS_OFFSET) as usize
    }

    #[must_use]
    pub fn next_leaf(&self) -> PageId {
        self.page.read_u32(LEAF_NEXT_LEAF_OFFSET)
    }

    /// Key stored in `slot`.
    #[must_use]
    pub fn key(&self, slot: usize) -> u32 {
        debug_assert!(slot < self.num_cells(), "slot {slot} out of range");
        self.page.read_u32(leaf_cell_offset(slot))
    }

    /// Decode the row stored in `slot`.
    pub fn cell(&self, slot: usize) -> Result<Row, NodeError> {
        debug_assert!(slot < self.num_cells(), "slot {slot} out of range");
        Row::deserialize(self.page.read_bytes(leaf_cell_offset(slot), LEAF_CELL_SIZE))
            .map_err(NodeError::CorruptCell)
    }

    /// Decode every row in the node, in key order.
    pub fn rows(&self) -> Result<Vec<Row>, NodeError> {
        (0..self.num_cells()).map(|slot| self.cell(slot)).collect()
    }

    /// Largest key in the node, or `None` if the node is empty.
    #[must_use]
    pub fn max_key(&self) -> Option<u32> {
        self.num_cells().checked_sub(1).map(|last| self.key(last))
    }

    /// Binary search for `key`.
    ///
    /// Returns `Ok(slot)` if present, otherwise `Err(slot)` where it would be inserted.
    pub fn find_slot(&self, key: u32) -> Result<usize, usize> {
        let mut low = 0;
        let mut high = self.num_cells();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.key(mid).cmp(&key) {
                std::cmp::Ordering::Equal => return Ok(mid),
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
            }
        }
        Err(low)
    }
}

/// Mutable view of a leaf node.
#[derive(Debug)]
pub struct LeafNodeMut<'a> {
    page: &'a mut Page,
}

impl<'a> LeafNodeMut<'a> {
    /// Initialize a page as an empty, non-root leaf.
    pub fn init(page: &'a mut Page) -> Self {
        page.clear();
        NodeHeader {
            node_type: NodeType::Leaf,
            is_root: false,
            parent_page: 0,
        }
        .write_to_page(page);
        page.write_u32(LEAF_NUM_CELLS_OFFSET, 0);
        page.write_u32(LEAF_NEXT_LEAF_OFFSET, NO_NEXT_LEAF);
        Self { page }
    }

    /// Borrow a page as a mutable leaf, validating it first.
    pub fn from_page(page: &'a mut Page) -> Result<Self, NodeError> {
        LeafNode::from_page(page)?;
        Ok(Self { page })
    }

    /// Read-only view of the same page.
    #[must_use]
    pub fn as_ref(&self) -> LeafNode<'_> {
        LeafNode { page: self.page }
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.page.write_u8(IS_ROOT_OFFSET, u8::from(is_root));
    }

    pub fn set_parent(&mut self, parent: PageId) {
        self.page.write_u32(PARENT_OFFSET, parent);
    }

    pub fn set_next_leaf(&mut self, next: PageId) {
        self.page.write_u32(LEAF_NEXT_LEAF_OFFSET, next);
    }

    fn set_num_cells(&mut self, count: usize) {
        self.page.write_u32(LEAF_NUM_CELLS_OFFSET, count as u32);
    }

    /// Replace the node's cells with `rows`, which must already be sorted.
    pub fn write_rows(&mut self, rows: &[Row]) -> Result<(), NodeError> {
        if rows.len() > LEAF_MAX_CELLS {
            return Err(NodeError::NodeFull);
        }
        for (slot, row) in rows.iter().enumerate() {
            let offset = leaf_cell_offset(slot);
            row.serialize(&mut self.page.as_bytes_mut()[offset..offset + LEAF_CELL_SIZE]);
        }
        self.set_num_cells(rows.len());
        Ok(())
    }

    /// Insert `row` at `slot`, shifting later cells one slot to the right.
    pub fn insert_cell(&mut self, slot: usize, row: &Row) -> Result<(), NodeError> {
        let count = self.as_ref().num_cells();
        if count >= LEAF_MAX_CELLS {
            return Err(NodeError::NodeFull);
        }
        debug_assert!(slot <= count, "slot {slot} past end of {count} cells");

        let start = leaf_cell_offset(slot);
        self.page.copy_within(
            start,
            start + LEAF_CELL_SIZE,
            (count - slot) * LEAF_CELL_SIZE,
        );
        row.serialize(&mut self.page.as_bytes_mut()[start..start + LEAF_CELL_SIZE]);
        self.set_num_cells(count + 1);
        Ok(())
    }

    /// Remove the cell at `slot`, shifting later cells one slot to the left.
    pub fn remove_cell(&mut self, slot: usize) {
        let count = self.as_ref().num_cells();
        debug_assert!(slot < count, "slot {slot} out of range");

        let start = leaf_cell_offset(slot);
        self.page.copy_within(
            start + LEAF_CELL_SIZE,
            start,
            (count - slot - 1) * LEAF_CELL_SIZE,
        );
        self.set_num_cells(count - 1);
    }
}

/// Read-only view of an internal node.
#[derive(Debug, Clone, Copy)]
pub struct InternalNode<'a> {
    page: &'a Page,
}

impl<'a> InternalNode<'a> {
    /// Borrow a page as an internal node, validating its tag and key count.
    ///
    /// A zeroed page carries the internal tag, so a node without keys is
    /// rejected rather than read as a lone pointer to page 0.
    pub fn from_page(page: &'a Page) -> Result<Self, NodeError> {
        let header = NodeHeader::from_page(page)?;
        if header.node_type != NodeType::Internal {
            return Err(NodeError::WrongNodeType);
        }
        let count = page.read_u32(INTERNAL_NUM_KEYS_OFFSET) as usize;
        if count > INTERNAL_MAX_KEYS {
            return Err(NodeError::CountOverCapacity {
                count,
                capacity: INTERNAL_MAX_KEYS,
            });
        }
        // Internal nodes are only ever written with at least one separator
        if count == 0 {
            return Err(NodeError::EmptyInternal);
        }
        Ok(Self { page })
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.page.read_u8(IS_ROOT_OFFSET) != 0
    }

    #[must_use]
    pub fn parent(&self) -> PageId {
        self.page.read_u32(PARENT_OFFSET)
    }

    #[must_use]
    pub fn num_keys(&self) -> usize {
        self.page.read_u32(INTERNAL_NUM_KEYS_OFFSET) as usize
    }

    #[must_use]
    pub fn right_child(&self) -> PageId {
        self.page.read_u32(INTERNAL_RIGHT_CHILD_OFFSET)
    }

    /// Child pointer at `index`; `index == num_keys()` names the right child.
    #[must_use]
    pub fn child(&self, index: usize) -> PageId {
        let count = self.num_keys();
        debug_assert!(index <= count, "child {index} out of range");
        if index == count {
            self.right_child()
        } else {
            self.page.read_u32(internal_cell_offset(index))
        }
    }

    /// Separator key at `index`.
    #[must_use]
    pub fn key(&self, index: usize) -> u32 {
        debug_assert!(index < self.num_keys(), "key {index} out of range");
        self.page.read_u32(internal_cell_offset(index) + 4)
    }

    /// All `(child, key)` entries, excluding the right child.
    #[must_use]
    pub fn entries(&self) -> Vec<(PageId, u32)> {
        (0..self.num_keys())
            .map(|i| (self.child(i), self.key(i)))
            .collect()
    }

    /// Every child pointer, left to right, including the right child.
    #[must_use]
    pub fn children(&self) -> Vec<PageId> {
        (0..=self.num_keys()).map(|i| self.child(i)).collect()
    }

    /// Index of the child whose subtree may contain `key`.
    ///
    /// This is the first separator `>= key`; a separator equal to `key`
    /// selects its own child because separators are subtree maxima. Returns
    /// `num_keys()` (the right child) when every separator is smaller.
    #[must_use]
    pub fn find_child_index(&self, key: u32) -> usize {
        let mut low = 0;
        let mut high = self.num_keys();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.key(mid) >= key {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low
    }

    /// Position of `child` among this node's children, if it is one.
    #[must_use]
    pub fn child_index_of(&self, child: PageId) -> Option<usize> {
        (0..=self.num_keys()).find(|&i| self.child(i) == child)
    }
}

/// Mutable view of an internal node.
#[derive(Debug)]
pub struct InternalNodeMut<'a> {
    page: &'a mut Page,
}

impl<'a> InternalNodeMut<'a> {
    /// Initialize a page as an empty, non-root internal node.
    pub fn init(page: &'a mut Page) -> Self {
        page.clear();
        NodeHeader {
            node_type: NodeType::Internal,
            is_root: false,
            parent_page: 0,
        }
        .write_to_page(page);
        page.write_u32(INTERNAL_NUM_KEYS_OFFSET, 0);
        page.write_u32(INTERNAL_RIGHT_CHILD_OFFSET, 0);
        Self { page }
    }

    /// Borrow a page as a mutable internal node, validating it first.
    pub fn from_page(page: &'a mut Page) -> Result<Self, NodeError> {
        InternalNode::from_page(page)?;
        Ok(Self { page })
    }

    /// Read-only view of the same page.
    #[must_use]
    pub fn as_ref(&self) -> InternalNode<'_> {
        InternalNode { page: self.page }
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.page.write_u8(IS_ROOT_OFFSET, u8::from(is_root));
    }

    pub fn set_parent(&mut self, parent: PageId) {
        self.page.write_u32(PARENT_OFFSET, parent);
    }

    pub fn set_right_child(&mut self, child: PageId) {
        self.page.write_u32(INTERNAL_RIGHT_CHILD_OFFSET, child);
    }

    /// Overwrite the separator at `index`.
    pub fn set_key(&mut self, index: usize, key: u32) {
        debug_assert!(index < self.as_ref().num_keys(), "key {index} out of range");
        self.page.write_u32(internal_cell_offset(index) + 4, key);
    }

    /// Replace all entries and the right child.
    pub fn write_entries(
        &mut self,
        entries: &[(PageId, u32)],
        right_child: PageId,
    ) -> Result<(), NodeError> {
        if entries.len() > INTERNAL_MAX_KEYS {
            return Err(NodeError::NodeFull);
        }
        for (index, &(child, key)) in entries.iter().enumerate() {
            let offset = internal_cell_offset(index);
            self.page.write_u32(offset, child);
            self.page.write_u32(offset + 4, key);
        }
        self.page
            .write_u32(INTERNAL_NUM_KEYS_OFFSET, entries.len() as u32);
        self.set_right_child(right_child);
        Ok(())
    }

    /// Insert a `(child, key)` entry at `index`, shifting later entries right.
    pub fn insert_entry(&mut self, index: usize, child: PageId, key: u32) -> Result<(), NodeError> {
        let count = self.as_ref().num_keys();
        if count >= INTERNAL_MAX_KEYS {
            return Err(NodeError::NodeFull);
        }
        debug_assert!(index <= count, "entry {index} past end of {count} keys");

        let start = internal_cell_offset(index);
        self.page.copy_within(
            start,
            start + INTERNAL_CELL_SIZE,
            (count - index) * INTERNAL_CELL_SIZE,
        );
        self.page.write_u32(start, child);
        self.page.write_u32(start + 4, key);
        self.page
            .write_u32(INTERNAL_NUM_KEYS_OFFSET, (count + 1) as u32);
        Ok(())
    }
}

/// Errors that can occur when interpreting a page as a node.
#[derive(Debug)]
pub enum NodeError {
    /// Unknown node type tag.
    InvalidNodeType(u8),
    /// Wrong node type for operation.
    WrongNodeType,
    /// Stored cell or key count exceeds what fits in a page.
    CountOverCapacity { count: usize, capacity: usize },
    /// An internal node with no separators.
    EmptyInternal,
    /// A leaf cell could not be decoded.
    CorruptCell(RowError),
    /// Node is full.
    NodeFull,
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNodeType(v) => write!(f, "invalid node type: 0x{v:02x}"),
            Self::WrongNodeType => write!(f, "wrong node type for operation"),
            Self::CountOverCapacity { count, capacity } => {
                write!(f, "node claims {count} entries (capacity {capacity})")
            }
            Self::EmptyInternal => write!(f, "internal node has no keys"),
            Self::CorruptCell(e) => write!(f, "corrupt cell: {e}"),
            Self::NodeFull => write!(f, "node is full"),
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CorruptCell(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: u32) -> Row {
        Row::new(key, &format!("v{key}")).expect("valid row")
    }

    #[test]
    fn test_capacities() {
        assert_eq!(NODE_HEADER_SIZE, 6);
        assert_eq!(LEAF_HEADER_SIZE, 14);
        assert_eq!(LEAF_CELL_SIZE, 16);
        assert_eq!(LEAF_MAX_CELLS, 255);
        assert_eq!(INTERNAL_HEADER_SIZE, 14);
        assert_eq!(INTERNAL_MAX_KEYS, 510);
    }

    #[test]
    fn test_header_roundtrip() {
        let mut page = Page::new();
        let header = NodeHeader {
            node_type: NodeType::Internal,
            is_root: true,
            parent_page: 0x0A0B_0C0D,
        };
        header.write_to_page(&mut page);

        assert_eq!(page.read_bytes(0, 6), &[0, 1, 0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(NodeHeader::from_page(&page).expect("parse"), header);
    }

    #[test]
    fn test_invalid_node_type() {
        let mut page = Page::new();
        page.write_u8(0, 9);
        assert!(matches!(
            Node::from_page(&page),
            Err(NodeError::InvalidNodeType(9))
        ));
    }

    #[test]
    fn test_node_dispatch_and_wrong_type() {
        let mut page = Page::new();
        LeafNodeMut::init(&mut page);
        assert!(matches!(Node::from_page(&page), Ok(Node::Leaf(_))));
        assert!(matches!(
            InternalNode::from_page(&page),
            Err(NodeError::WrongNodeType)
        ));

        InternalNodeMut::init(&mut page)
            .write_entries(&[(1, 10)], 2)
            .expect("write");
        assert!(matches!(Node::from_page(&page), Ok(Node::Internal(_))));
        assert!(matches!(
            LeafNode::from_page(&page),
            Err(NodeError::WrongNodeType)
        ));
    }

    #[test]
    fn test_count_over_capacity_rejected() {
        let mut page = Page::new();
        LeafNodeMut::init(&mut page);
        page.write_u32(LEAF_NUM_CELLS_OFFSET, (LEAF_MAX_CELLS + 1) as u32);
        assert!(matches!(
            LeafNode::from_page(&page),
            Err(NodeError::CountOverCapacity { .. })
        ));
    }

    #[test]
    fn test_zeroed_page_is_not_a_node() {
        let page = Page::new();
        assert!(matches!(
            Node::from_page(&page),
            Err(NodeError::EmptyInternal)
        ));
    }

    #[test]
    fn test_leaf_insert_keeps_order() {
        let mut page = Page::new();
        let mut leaf = LeafNodeMut::init(&mut page);

        for key in [5, 1, 3] {
            let slot = leaf.as_ref().find_slot(key).expect_err("absent");
            leaf.insert_cell(slot, &row(key)).expect("insert");
        }

        let view = LeafNode::from_page(&page).expect("leaf");
        assert_eq!(view.num_cells(), 3);
        assert_eq!((view.key(0), view.key(1), view.key(2)), (1, 3, 5));
        assert_eq!(view.cell(1).expect("cell"), row(3));
        assert_eq!(view.max_key(), Some(5));
        assert_eq!(view.find_slot(3), Ok(1));
        assert_eq!(view.find_slot(4), Err(2));
        assert_eq!(view.find_slot(9), Err(3));
    }

    #[test]
    fn test_leaf_remove_shifts_left() {
        let mut page = Page::new();
        let mut leaf = LeafNodeMut::init(&mut page);
        leaf.write_rows(&[row(1), row(2), row(3)]).expect("write");

        leaf.remove_cell(0);
        assert_eq!(leaf.as_ref().rows().expect("rows"), vec![row(2), row(3)]);

        leaf.remove_cell(1);
        leaf.remove_cell(0);
        assert_eq!(leaf.as_ref().num_cells(), 0);
        assert_eq!(leaf.as_ref().max_key(), None);
    }

    #[test]
    fn test_leaf_full() {
        let mut page = Page::new();
        let mut leaf = LeafNodeMut::init(&mut page);
        let rows: Vec<Row> = (0..LEAF_MAX_CELLS as u32).map(row).collect();
        leaf.write_rows(&rows).expect("fill");

        assert!(matches!(
            leaf.insert_cell(0, &row(999)),
            Err(NodeError::NodeFull)
        ));
    }

    #[test]
    fn test_internal_find_child_ties_go_left() {
        let mut page = Page::new();
        let mut node = InternalNodeMut::init(&mut page);
        node.write_entries(&[(100, 10), (200, 20), (300, 30)], 400)
            .expect("write");

        let view = node.as_ref();
        assert_eq!(view.find_child_index(5), 0);
        // Equal to a separator -> that separator's child (separators are maxima)
        assert_eq!(view.find_child_index(10), 0);
        assert_eq!(view.find_child_index(11), 1);
        assert_eq!(view.find_child_index(30), 2);
        // Greater than all -> right child
        assert_eq!(view.find_child_index(31), 3);
        assert_eq!(view.child(3), 400);
    }

    #[test]
    fn test_internal_insert_entry_and_lookup() {
        let mut page = Page::new();
        let mut node = InternalNodeMut::init(&mut page);
        node.write_entries(&[(1, 10), (3, 30)], 4).expect("write");
        node.insert_entry(1, 2, 20).expect("insert");
        node.set_key(0, 9);

        let view = node.as_ref();
        assert_eq!(view.entries(), vec![(1, 9), (2, 20), (3, 30)]);
        assert_eq!(view.children(), vec![1, 2, 3, 4]);
        assert_eq!(view.child_index_of(3), Some(2));
        assert_eq!(view.child_index_of(4), Some(3));
        assert_eq!(view.child_index_of(99), None);
    }
}
