//! Positioned access to rows along the leaf chain.

use crate::storage::btree::node::{LeafNode, LeafNodeMut, NO_NEXT_LEAF};
use crate::storage::btree::tree::TreeError;
use crate::storage::btree::verify::InvariantViolation;
use crate::storage::page::PageId;
use crate::storage::pager::Pager;
use crate::types::Row;

/// A `(page, slot)` position in the tree's leaves.
///
/// Once a cursor reaches the end of the table it stays there.
pub struct Cursor<'a> {
    pager: &'a mut Pager,
    page_id: PageId,
    slot: usize,
    end_of_table: bool,
    /// Leaves stepped into through `next_leaf`.
    hops: usize,
}

impl<'a> Cursor<'a> {
    pub(super) const fn at(pager: &'a mut Pager, page_id: PageId, slot: usize) -> Self {
        Self {
            pager,
            page_id,
            slot,
            end_of_table: false,
            hops: 0,
        }
    }

    #[must_use]
    pub const fn page_id(&self) -> PageId {
        self.page_id
    }

    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Row under the cursor, or `None` at end of table or past the leaf's last cell.
    pub fn value(&mut self) -> Result<Option<Row>, TreeError> {
        if self.end_of_table {
            return Ok(None);
        }
        let leaf = LeafNode::from_page(self.pager.fetch(self.page_id)?)?;
        if self.slot >= leaf.num_cells() {
            return Ok(None);
        }
        Ok(Some(leaf.cell(self.slot)?))
    }

    /// Move to the next row, crossing into later leaves as needed.
    pub fn advance(&mut self) -> Result<(), TreeError> {
        if self.end_of_table {
            return Ok(());
        }
        self.slot += 1;
        self.settle()
    }

    /// Return the row under the cursor and step past it.
    pub fn next_row(&mut self) -> Result<Option<Row>, TreeError> {
        let row = self.value()?;
        if row.is_some() {
            self.advance()?;
        }
        Ok(row)
    }

    /// Delete the row under the cursor.
    ///
    /// The cursor stays on the same slot, which now holds the following row;
    /// if the leaf has no more rows it moves on to the next non-empty leaf.
    pub fn remove(&mut self) -> Result<Option<Row>, TreeError> {
        let Some(row) = self.value()? else {
            return Ok(None);
        };

        LeafNodeMut::from_page(self.pager.fetch_mut(self.page_id)?)?.remove_cell(self.slot);
        self.settle()?;
        Ok(Some(row))
    }

    /// Skip forward until the cursor names an existing cell or the end.
    ///
    /// Empty leaves left behind by deletions are passed over.
    pub(super) fn settle(&mut self) -> Result<(), TreeError> {
        while !self.end_of_table {
            let leaf = LeafNode::from_page(self.pager.fetch(self.page_id)?)?;
            if self.slot < leaf.num_cells() {
                break;
            }

            let next = leaf.next_leaf();
            if next == NO_NEXT_LEAF {
                self.end_of_table = true;
                continue;
            }

            // Each leaf is entered at most once, so more hops than pages is a loop
            self.hops += 1;
            let num_pages = self.pager.num_pages();
            if next >= num_pages || self.hops >= num_pages as usize {
                return Err(InvariantViolation::BrokenLeafChain { page: self.page_id }.into());
            }
            self.page_id = next;
            self.slot = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::btree::node::LeafNodeMut;
    use crate::storage::btree::tree::{BTree, NodeLimits, TreeError};
    use crate::storage::btree::verify::InvariantViolation;
    use crate::storage::pager::Pager;
    use crate::types::Row;
    use tempfile::tempdir;

    fn row(key: u32) -> Row {
        Row::new(key, &format!("r{key}")).expect("valid row")
    }

    #[test]
    fn test_empty_table_starts_at_end() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        let mut tree = BTree::new(&mut pager, NodeLimits::default());

        let mut cursor = tree.start().expect("start");
        assert!(cursor.is_end());
        assert_eq!(cursor.value().expect("value"), None);

        // Advancing at the end is a no-op
        cursor.advance().expect("advance");
        assert!(cursor.is_end());
    }

    #[test]
    fn test_advance_crosses_leaves() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        let mut tree = BTree::new(&mut pager, NodeLimits::new(2, 2));

        for key in 0..9 {
            tree.insert(&row(key)).expect("insert");
        }

        let mut cursor = tree.start().expect("start");
        let mut pages = Vec::new();
        let mut seen = Vec::new();
        while let Some(r) = cursor.value().expect("value") {
            pages.push(cursor.page_id());
            seen.push(r.key);
            cursor.advance().expect("advance");
        }

        assert_eq!(seen, (0..9).collect::<Vec<_>>());
        pages.dedup();
        assert!(pages.len() > 1, "scan should visit several leaves");
        assert!(cursor.is_end());
    }

    #[test]
    fn test_remove_keeps_position() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        let mut tree = BTree::new(&mut pager, NodeLimits::new(3, 3));

        for key in 0..6 {
            tree.insert(&row(key)).expect("insert");
        }

        let mut cursor = tree.find(1).expect("find");
        assert_eq!(cursor.remove().expect("remove"), Some(row(1)));
        // The next row slid into the removed slot
        assert_eq!(cursor.value().expect("value"), Some(row(2)));
        assert_eq!(cursor.remove().expect("remove"), Some(row(2)));
        assert_eq!(cursor.next_row().expect("next"), Some(row(3)));
    }

    #[test]
    fn test_remove_last_cell_moves_to_next_leaf() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        let mut tree = BTree::new(&mut pager, NodeLimits::new(2, 2));

        for key in 0..3 {
            tree.insert(&row(key)).expect("insert");
        }

        // Leaves are [0] and [1, 2]; emptying the first must not lose key 1
        let mut cursor = tree.start().expect("start");
        assert_eq!(cursor.remove().expect("remove"), Some(row(0)));
        assert_eq!(cursor.value().expect("value"), Some(row(1)));
        assert_eq!(cursor.next_row().expect("next"), Some(row(1)));
        assert_eq!(cursor.next_row().expect("next"), Some(row(2)));
        assert_eq!(cursor.next_row().expect("next"), None);
        assert!(cursor.is_end());
    }

    #[test]
    fn test_looping_leaf_chain_is_an_error() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        {
            let mut tree = BTree::new(&mut pager, NodeLimits::new(2, 2));
            for key in 0..3 {
                tree.insert(&row(key)).expect("insert");
            }
        }

        // Leaves are page 2 -> page 1; link the last one back to the first
        LeafNodeMut::from_page(pager.fetch_mut(1).expect("fetch"))
            .expect("leaf")
            .set_next_leaf(2);

        let mut tree = BTree::new(&mut pager, NodeLimits::new(2, 2));
        let mut cursor = tree.start().expect("start");
        let result = loop {
            match cursor.next_row() {
                Ok(Some(_)) => {}
                other => break other,
            }
        };
        assert!(matches!(
            result,
            Err(TreeError::Invariant(InvariantViolation::BrokenLeafChain { .. }))
        ));
    }
}
