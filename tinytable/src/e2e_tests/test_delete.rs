//! Deleting rows by value.

use crate::e2e_tests::helpers::{TestDb, lines};
use crate::storage::btree::NodeLimits;

#[test]
fn test_delete_by_value() {
    let db = TestDb::new();
    let output = db.run(&["insert 1 a", "insert 2 b", "insert 3 a", "delete a", "select"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > (2, b)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_delete_missing_value_is_noop() {
    let db = TestDb::new();
    let output = db.run(&["insert 1 a", "delete nope", "select"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Executed.",
            "db > (1, a)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_delete_across_many_leaves() {
    let db = TestDb::with_limits(NodeLimits::new(3, 3));
    let mut script: Vec<String> = (0..60)
        .map(|key| format!("insert {key} {}", if key % 4 == 0 { "gone" } else { "kept" }))
        .collect();
    script.push("delete gone".to_string());
    let script: Vec<&str> = script.iter().map(String::as_str).collect();
    db.run(&script);

    let mut table = db.open_table();
    let rows = table.select(None).expect("select");
    assert_eq!(rows.len(), 45);
    assert!(rows.iter().all(|row| row.key % 4 != 0));
    assert!(rows.windows(2).all(|pair| pair[0].key < pair[1].key));

    // Emptied leaves still accept the keys that were removed
    let stats = table.stats().expect("valid tree");
    assert_eq!(stats.row_count, 45);
    table
        .insert(&crate::types::Row::new(0, "back").expect("valid row"))
        .expect("reinsert");
    assert_eq!(table.get(0).expect("get").map(|row| row.key), Some(0));
}
