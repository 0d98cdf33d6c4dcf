//! High-level table interface.
//!
//! A [`Table`] owns the pager for one file and runs each command against a
//! [`BTree`] borrowed for the duration of that command. Nothing reaches the
//! file until [`Table::close`] flushes the cache.

use std::path::Path;

use crate::storage::btree::{
    BTree, INTERNAL_MAX_KEYS, InvariantViolation, LEAF_MAX_CELLS, Node, NodeLimits, ROOT_PAGE,
    TreeError, TreeStats,
};
use crate::storage::file::FileError;
use crate::storage::page::PageId;
use crate::storage::pager::Pager;
use crate::types::{Row, Value};

/// An open table file.
#[derive(Debug)]
pub struct Table {
    pager: Pager,
    limits: NodeLimits,
}

impl Table {
    /// Open the table at `path`, creating an empty one if the file is missing or empty.
    pub fn open(path: &Path) -> Result<Self, TableError> {
        Self::open_with_limits(path, NodeLimits::default())
    }

    /// Open the table with custom split thresholds.
    pub fn open_with_limits(path: &Path, limits: NodeLimits) -> Result<Self, TableError> {
        if !limits.is_valid() {
            return Err(TableError::InvalidLimits(limits));
        }

        let mut pager = Pager::open(path)?;
        let created = BTree::bootstrap(&mut pager)?;

        let root = Node::from_page(pager.fetch(ROOT_PAGE)?)
            .and_then(|node| node.header())
            .map_err(TreeError::from)?;
        if !root.is_root {
            return Err(TreeError::from(InvariantViolation::RootFlag { page: ROOT_PAGE }).into());
        }

        tracing::info!(
            "opened table {} ({} pages{})",
            path.display(),
            pager.num_pages(),
            if created { ", new" } else { "" }
        );

        Ok(Self { pager, limits })
    }

    fn tree(&mut self) -> BTree<'_> {
        BTree::new(&mut self.pager, self.limits)
    }

    #[must_use]
    pub const fn limits(&self) -> NodeLimits {
        self.limits
    }

    /// Number of pages in use, including ones not yet flushed.
    #[must_use]
    pub const fn num_pages(&self) -> PageId {
        self.pager.num_pages()
    }

    /// Insert a row. Fails with [`TreeError::DuplicateKey`] if the key exists.
    pub fn insert(&mut self, row: &Row) -> Result<(), TableError> {
        self.tree().insert(row)?;
        Ok(())
    }

    /// Look up a single row by key.
    pub fn get(&mut self, key: u32) -> Result<Option<Row>, TableError> {
        let mut tree = self.tree();
        let mut cursor = tree.find(key)?;
        Ok(cursor.value()?.filter(|row| row.key == key))
    }

    /// Rows in ascending key order, optionally only those whose value equals `filter`.
    pub fn select(&mut self, filter: Option<&Value>) -> Result<Vec<Row>, TableError> {
        let mut tree = self.tree();
        let mut cursor = tree.start()?;
        let mut rows = Vec::new();

        while let Some(row) = cursor.next_row()? {
            if filter.is_none_or(|value| row.value == *value) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Delete every row whose value equals `filter`. Returns the number removed.
    pub fn delete(&mut self, filter: &Value) -> Result<usize, TableError> {
        Ok(self.tree().delete_matching(|row| row.value == *filter)?)
    }

    /// Verify the tree structure and return its statistics.
    pub fn stats(&mut self) -> Result<TreeStats, TableError> {
        Ok(self.tree().check_invariants()?)
    }

    /// Text dump of the tree structure.
    pub fn render(&mut self) -> Result<String, TableError> {
        Ok(self.tree().render()?)
    }

    /// Write all modified pages back to the file and close it.
    ///
    /// Returns the number of pages written.
    pub fn close(mut self) -> Result<usize, TableError> {
        let written = self.pager.flush_all()?;
        tracing::info!("closed table ({} pages)", self.pager.num_pages());
        Ok(written)
    }
}

/// Errors that can occur during table operations.
#[derive(Debug)]
pub enum TableError {
    /// File I/O error.
    File(FileError),
    /// B+tree error.
    Tree(TreeError),
    /// Split thresholds outside the supported range.
    InvalidLimits(NodeLimits),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(e) => write!(f, "file error: {e}"),
            Self::Tree(e) => write!(f, "{e}"),
            Self::InvalidLimits(limits) => write!(
                f,
                "invalid node limits: leaf {} must be in {min}..={LEAF_MAX_CELLS}, internal {} in {min}..={INTERNAL_MAX_KEYS}",
                limits.leaf_max_cells,
                limits.internal_max_keys,
                min = NodeLimits::MIN,
            ),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::File(e) => Some(e),
            Self::Tree(e) => Some(e),
            Self::InvalidLimits(_) => None,
        }
    }
}

impl From<FileError> for TableError {
    fn from(e: FileError) -> Self {
        Self::File(e)
    }
}

impl From<TreeError> for TableError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::btree::NodeError;
    use crate::storage::page::{PAGE_SIZE, Page};
    use tempfile::tempdir;

    fn create_test_db() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        (dir, path)
    }

    fn row(key: u32, value: &str) -> Row {
        Row::new(key, value).expect("valid row")
    }

    fn value(text: &str) -> Value {
        Value::new(text).expect("valid value")
    }

    #[test]
    fn test_round_trip() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        table.insert(&row(1, "foo")).expect("insert");
        table.insert(&row(2, "bar")).expect("insert");

        assert_eq!(
            table.select(None).expect("select"),
            vec![row(1, "foo"), row(2, "bar")]
        );
    }

    #[test]
    fn test_select_with_filter() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        table.insert(&row(1, "a")).expect("insert");
        table.insert(&row(2, "b")).expect("insert");
        table.insert(&row(3, "a")).expect("insert");

        assert_eq!(
            table.select(Some(&value("a"))).expect("select"),
            vec![row(1, "a"), row(3, "a")]
        );
        assert!(table.select(Some(&value("zzz"))).expect("select").is_empty());
    }

    #[test]
    fn test_get_point_lookup() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open_with_limits(&path, NodeLimits::new(3, 3)).expect("open");

        for key in (0..40).step_by(2) {
            table.insert(&row(key, "even")).expect("insert");
        }

        assert_eq!(table.get(10).expect("get"), Some(row(10, "even")));
        assert_eq!(table.get(11).expect("get"), None);
        assert_eq!(table.get(100).expect("get"), None);
    }

    #[test]
    fn test_delete_by_value() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open_with_limits(&path, NodeLimits::new(4, 4)).expect("open");

        for key in 0..50 {
            let v = if key % 5 == 0 { "drop" } else { "keep" };
            table.insert(&row(key, v)).expect("insert");
        }

        assert_eq!(table.delete(&value("drop")).expect("delete"), 10);
        let rows = table.select(None).expect("select");
        assert_eq!(rows.len(), 40);
        assert!(rows.iter().all(|r| r.value.as_str() == "keep"));

        // Nothing left to delete
        assert_eq!(table.delete(&value("drop")).expect("delete"), 0);
        table.stats().expect("valid tree");
    }

    #[test]
    fn test_persistence_across_reopen() {
        let (_dir, path) = create_test_db();
        let limits = NodeLimits::new(5, 3);

        let expected = {
            let mut table = Table::open_with_limits(&path, limits).expect("open");
            for key in [17, 3, 99, 42, 8, 0, 56, 23, 71, 12, 64, 5, 30] {
                table.insert(&row(key, &format!("n{key}"))).expect("insert");
            }
            let rows = table.select(None).expect("select");
            assert!(table.close().expect("close") > 0);
            rows
        };

        let file_len = std::fs::metadata(&path).expect("metadata").len();
        assert_eq!(file_len % PAGE_SIZE as u64, 0);

        let mut table = Table::open_with_limits(&path, limits).expect("reopen");
        assert_eq!(table.limits(), limits);
        assert_eq!(table.select(None).expect("select"), expected);
        assert!(table.stats().expect("valid").height > 1);
    }

    #[test]
    fn test_changes_without_close_are_not_persisted() {
        let (_dir, path) = create_test_db();
        {
            let mut table = Table::open(&path).expect("open");
            table.insert(&row(1, "lost")).expect("insert");
        }

        let mut table = Table::open(&path).expect("reopen");
        assert!(table.select(None).expect("select").is_empty());
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let (_dir, path) = create_test_db();
        let result = Table::open_with_limits(&path, NodeLimits::new(1, 4));
        assert!(matches!(result, Err(TableError::InvalidLimits(_))));
    }

    #[test]
    fn test_corrupt_file_rejected() {
        let (_dir, path) = create_test_db();
        std::fs::write(&path, [0u8; 100]).expect("write");

        let result = Table::open(&path);
        assert!(matches!(
            result,
            Err(TableError::File(FileError::CorruptLength { file_length: 100 }))
        ));
    }

    /// Write hand-built pages as the whole table file.
    fn write_pages(path: &std::path::Path, pages: &[Page]) {
        let bytes: Vec<u8> = pages.iter().flat_map(|page| page.as_bytes().to_vec()).collect();
        std::fs::write(path, bytes).expect("write");
    }

    /// An internal node page: kind 0, root flag, parent 0, then entries.
    fn internal_page(is_root: bool, entries: &[(PageId, u32)], right_child: PageId) -> Page {
        let mut page = Page::new();
        page.write_u8(1, u8::from(is_root));
        page.write_u32(6, u32::try_from(entries.len()).expect("fits"));
        page.write_u32(10, right_child);
        for (index, &(child, key)) in entries.iter().enumerate() {
            page.write_u32(14 + index * 8, child);
            page.write_u32(18 + index * 8, key);
        }
        page
    }

    /// An empty non-root leaf page under page 0.
    fn empty_leaf_page() -> Page {
        let mut page = Page::new();
        page.write_u8(0, 1);
        page
    }

    #[test]
    fn test_non_root_page_zero_rejected() {
        let (_dir, path) = create_test_db();
        write_pages(&path, &[empty_leaf_page()]);

        let result = Table::open(&path);
        assert!(matches!(
            result,
            Err(TableError::Tree(TreeError::Invariant(
                InvariantViolation::RootFlag { page: 0 }
            )))
        ));
    }

    #[test]
    fn test_zeroed_page_zero_rejected() {
        let (_dir, path) = create_test_db();
        std::fs::write(&path, vec![0u8; PAGE_SIZE]).expect("write");

        let result = Table::open(&path);
        assert!(matches!(
            result,
            Err(TableError::Tree(TreeError::Node(NodeError::EmptyInternal)))
        ));
    }

    #[test]
    fn test_empty_internal_root_rejected() {
        let (_dir, path) = create_test_db();
        // What a crash after writing only the new root of a split leaves behind
        write_pages(&path, &[internal_page(true, &[], 1)]);

        assert!(matches!(
            Table::open(&path),
            Err(TableError::Tree(TreeError::Node(NodeError::EmptyInternal)))
        ));
    }

    #[test]
    fn test_child_pointing_at_root_is_an_error() {
        let (_dir, path) = create_test_db();
        write_pages(&path, &[internal_page(true, &[(0, 10)], 0)]);

        let mut table = Table::open(&path).expect("open");
        assert!(matches!(
            table.select(None),
            Err(TableError::Tree(TreeError::Invariant(
                InvariantViolation::DanglingChild { parent: 0, child: 0 }
            )))
        ));
    }

    #[test]
    fn test_child_past_end_of_file_is_an_error() {
        let (_dir, path) = create_test_db();
        write_pages(
            &path,
            &[internal_page(true, &[(1, 10)], 7), empty_leaf_page()],
        );

        let mut table = Table::open(&path).expect("open");
        // Keys up to 10 live in the valid leaf
        assert_eq!(table.get(3).expect("get"), None);
        assert!(matches!(
            table.get(50),
            Err(TableError::Tree(TreeError::Invariant(
                InvariantViolation::DanglingChild { parent: 0, child: 7 }
            )))
        ));
        assert!(table.stats().is_err());
        assert_eq!(table.num_pages(), 2);
    }

    #[test]
    fn test_child_loop_is_an_error() {
        let (_dir, path) = create_test_db();
        write_pages(
            &path,
            &[
                internal_page(true, &[(1, 10)], 1),
                internal_page(false, &[(1, 10)], 1),
            ],
        );

        let mut table = Table::open(&path).expect("open");
        assert!(matches!(
            table.get(5),
            Err(TableError::Tree(TreeError::Invariant(
                InvariantViolation::Cycle { page: 1 }
            )))
        ));
        assert!(table.render().is_err());
    }
}
