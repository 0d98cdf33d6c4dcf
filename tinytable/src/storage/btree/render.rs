//! Indented text dump of the tree, one line per node, key and separator.

use crate::storage::btree::node::Node;
use crate::storage::btree::tree::{BTree, ROOT_PAGE, TreeError};
use crate::storage::page::PageId;

impl BTree<'_> {
    /// Render the whole tree, starting at the root.
    ///
    /// ```text
    /// - internal (size 1)
    ///   - leaf (size 2)
    ///     - 1
    ///     - 2
    ///   - key 2
    ///   - leaf (size 1)
    ///     - 3
    /// ```
    pub fn render(&mut self) -> Result<String, TreeError> {
        let mut lines = Vec::new();
        self.render_node(ROOT_PAGE, 0, &mut lines)?;
        Ok(lines.join("\n"))
    }

    fn render_node(
        &mut self,
        page_id: PageId,
        depth: usize,
        lines: &mut Vec<String>,
    ) -> Result<(), TreeError> {
        let indent = "  ".repeat(depth);

        let (entries, right_child) = match Node::from_page(self.pager.fetch(page_id)?)? {
            Node::Leaf(leaf) => {
                lines.push(format!("{indent}- leaf (size {})", leaf.num_cells()));
                for slot in 0..leaf.num_cells() {
                    lines.push(format!("{indent}  - {}", leaf.key(slot)));
                }
                return Ok(());
            }
            Node::Internal(node) => (node.entries(), node.right_child()),
        };

        lines.push(format!("{indent}- internal (size {})", entries.len()));
        for (child, key) in entries {
            let child = self.child_page(page_id, child, depth + 2)?;
            self.render_node(child, depth + 1, lines)?;
            lines.push(format!("{indent}  - key {key}"));
        }
        let right_child = self.child_page(page_id, right_child, depth + 2)?;
        self.render_node(right_child, depth + 1, lines)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::btree::tree::{BTree, NodeLimits};
    use crate::storage::pager::Pager;
    use crate::types::Row;
    use tempfile::tempdir;

    #[test]
    fn test_render_single_leaf() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        let mut tree = BTree::new(&mut pager, NodeLimits::default());

        assert_eq!(tree.render().expect("render"), "- leaf (size 0)");

        for key in [3, 1, 2] {
            tree.insert(&Row::new(key, "x").expect("valid row"))
                .expect("insert");
        }
        assert_eq!(
            tree.render().expect("render"),
            "- leaf (size 3)\n  - 1\n  - 2\n  - 3"
        );
    }

    #[test]
    fn test_render_two_levels() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db")).expect("open");
        BTree::bootstrap(&mut pager).expect("bootstrap");
        let mut tree = BTree::new(&mut pager, NodeLimits::new(2, 2));

        for key in 1..=3 {
            tree.insert(&Row::new(key, "x").expect("valid row"))
                .expect("insert");
        }

        let expected = [
            "- internal (size 1)",
            "  - leaf (size 1)",
            "    - 1",
            "  - key 1",
            "  - leaf (size 2)",
            "    - 2",
            "    - 3",
        ]
        .join("\n");
        assert_eq!(tree.render().expect("render"), expected);
    }
}
