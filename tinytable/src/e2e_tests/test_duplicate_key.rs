//! Inserting an existing key is rejected and leaves the table unchanged.

use crate::e2e_tests::helpers::{TestDb, lines};
use crate::storage::btree::NodeLimits;

#[test]
fn test_duplicate_key_rejected() {
    let db = TestDb::new();
    let output = db.run(&["insert 1 a", "insert 1 b", "select"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Error: Duplicate key.",
            "db > (1, a)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_duplicate_after_splits() {
    let db = TestDb::with_limits(NodeLimits::new(2, 2));
    let mut script: Vec<String> = (0..20).map(|key| format!("insert {key} v")).collect();
    script.push("insert 7 again".to_string());
    script.push("insert 19 again".to_string());
    let script: Vec<&str> = script.iter().map(String::as_str).collect();

    let output = db.run(&script);
    assert_eq!(output[20], "db > Error: Duplicate key.");
    assert_eq!(output[21], "db > Error: Duplicate key.");

    let mut table = db.open_table();
    let rows = table.select(None).expect("select");
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|row| row.value.as_str() == "v"));
    table.stats().expect("valid tree");
}
