//! Insert rows and read them back with full and filtered scans.

use crate::e2e_tests::helpers::{TestDb, executed_then_bye, lines};

#[test]
fn test_insert_and_select_round_trip() {
    let db = TestDb::new();
    let output = db.run(&["insert 1 foo", "insert 2 bar", "select", ".exit"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Executed.",
            "db > (1, foo)",
            "(2, bar)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_select_empty_table() {
    let db = TestDb::new();
    let output = db.run(&["select"]);

    assert_eq!(
        output,
        lines(&["db > (no rows)", "Executed.", "db > bye~"])
    );
}

#[test]
fn test_select_returns_ascending_keys() {
    let db = TestDb::new();
    let output = db.run(&["insert 30 c", "insert 10 a", "insert 20 b", "select"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > (10, a)",
            "(20, b)",
            "(30, c)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_select_with_filter() {
    let db = TestDb::new();
    let output = db.run(&["insert 1 a", "insert 2 b", "insert 3 a", "select a", "select zz"]);

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > (1, a)",
            "(3, a)",
            "Executed.",
            "db > (no rows)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_blank_lines_are_ignored() {
    let db = TestDb::new();
    let output = db.run(&["", "insert 1 a", "   "]);

    assert_eq!(
        output,
        lines(&["db > db > Executed.", "db > db > bye~"])
    );
}

#[test]
fn test_boundary_keys_and_values() {
    let db = TestDb::new();
    let output = db.run(&["insert 0 abcdefghijk", "insert 4294967295 z"]);
    assert_eq!(output, executed_then_bye(2));

    let mut table = db.open_table();
    let rows = table.select(None).expect("select");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].to_string(), "(0, abcdefghijk)");
    assert_eq!(rows[1].to_string(), "(4294967295, z)");
}
