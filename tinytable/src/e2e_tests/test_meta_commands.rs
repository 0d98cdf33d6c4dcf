//! `.btree` and `.constants` output.

use crate::e2e_tests::helpers::{TestDb, lines};
use crate::storage::btree::NodeLimits;

#[test]
fn test_btree_single_leaf() {
    let db = TestDb::new();
    let output = db.run(&["insert 3 c", "insert 1 a", "insert 2 b", ".btree"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > Tree:",
            "- leaf (size 3)",
            "  - 1",
            "  - 2",
            "  - 3",
            "db > bye~",
        ])
    );
}

#[test]
fn test_btree_after_split() {
    let db = TestDb::with_limits(NodeLimits::new(2, 2));
    let output = db.run(&["insert 1 a", "insert 2 b", "insert 3 c", ".btree"]);

    assert_eq!(
        output[3..],
        lines(&[
            "db > Tree:",
            "- internal (size 1)",
            "  - leaf (size 1)",
            "    - 1",
            "  - key 1",
            "  - leaf (size 2)",
            "    - 2",
            "    - 3",
            "db > bye~",
        ])
    );
}

#[test]
fn test_constants() {
    let db = TestDb::new();
    let output = db.run(&[".constants"]);

    assert_eq!(
        output,
        lines(&[
            "db > Constants:",
            "PAGE_SIZE: 4096",
            "ROW_SIZE: 16",
            "COMMON_NODE_HEADER_SIZE: 6",
            "LEAF_NODE_HEADER_SIZE: 14",
            "LEAF_NODE_CELL_SIZE: 16",
            "LEAF_NODE_SPACE_FOR_CELLS: 4082",
            "LEAF_NODE_MAX_CELLS: 255",
            "INTERNAL_NODE_HEADER_SIZE: 14",
            "INTERNAL_NODE_CELL_SIZE: 8",
            "INTERNAL_NODE_MAX_KEYS: 510",
            "db > bye~",
        ])
    );
}

#[test]
fn test_exit_stops_reading() {
    let db = TestDb::new();
    let output = db.run(&[".exit", "insert 1 never"]);

    assert_eq!(output, lines(&["db > bye~"]));
    assert!(db.open_table().select(None).expect("select").is_empty());
}
