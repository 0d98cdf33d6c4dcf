//! Enough rows to split leaves and internal nodes.

use crate::e2e_tests::helpers::TestDb;
use crate::storage::btree::{LEAF_MAX_CELLS, NodeLimits};

#[test]
fn test_one_more_row_than_a_leaf_holds() {
    let db = TestDb::new();
    let count = u32::try_from(LEAF_MAX_CELLS).expect("fits") + 1;

    let script: Vec<String> = (0..count).map(|key| format!("insert {key} r{key}")).collect();
    let mut script: Vec<&str> = script.iter().map(String::as_str).collect();
    script.push("select");
    let output = db.run(&script);

    // One line per insert, then one per row, then Executed and bye
    let rows = &output[count as usize..output.len() - 2];
    assert_eq!(rows[0], "db > (0, r0)");
    assert_eq!(rows.len(), count as usize);
    assert_eq!(rows[rows.len() - 1], format!("({}, r{})", count - 1, count - 1));

    let stats = db.open_table().stats().expect("valid tree");
    assert_eq!(stats.height, 2);
    assert_eq!(stats.leaf_count, 2);
    assert_eq!(stats.row_count, count as usize);
}

#[test]
fn test_random_order_inserts_stay_sorted() {
    let db = TestDb::with_limits(NodeLimits::new(3, 2));
    // 7 is coprime with 500, so this visits every key once in scrambled order
    let script: Vec<String> = (0..500u32)
        .map(|i| format!("insert {} x", (i * 7) % 500))
        .collect();
    let script: Vec<&str> = script.iter().map(String::as_str).collect();
    db.run(&script);

    let mut table = db.open_table();
    let keys: Vec<u32> = table
        .select(None)
        .expect("select")
        .iter()
        .map(|row| row.key)
        .collect();
    assert_eq!(keys, (0..500).collect::<Vec<_>>());

    let stats = table.stats().expect("valid tree");
    assert!(stats.internal_count > 1);
    assert_eq!(stats.stale_separators, 0);
}
