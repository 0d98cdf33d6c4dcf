//! Lines that are rejected before reaching the table.

use crate::e2e_tests::helpers::{TestDb, lines};

#[test]
fn test_negative_key() {
    let db = TestDb::new();
    let output = db.run(&["insert -1 foo", "select"]);

    assert_eq!(
        output,
        lines(&[
            "db > Column key must be non-negative.",
            "db > (no rows)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_value_too_long() {
    let db = TestDb::new();
    let output = db.run(&["insert 1 abcdefghijkl", "select"]);

    assert_eq!(
        output,
        lines(&[
            "db > String for column value is too long.",
            "db > (no rows)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_input_too_long() {
    let db = TestDb::new();
    // 32 bytes, one over the default limit
    let long_line = "insert 1 aaaaaaaaaaaaaaaaaaaaaaa";
    assert_eq!(long_line.len(), 32);

    let output = db.run(&[long_line, "select"]);
    assert_eq!(
        output,
        lines(&[
            "db > Input is too long.",
            "db > (no rows)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_syntax_errors() {
    let db = TestDb::new();
    let output = db.run(&[
        "insert",
        "insert 1",
        "insert one a",
        "insert 1 a b",
        "insert 99999999999 a",
        "delete",
        "select a b",
    ]);

    let mut expected = vec!["db > Syntax error. Could not parse statement."; 7];
    expected.push("db > bye~");
    assert_eq!(output, lines(&expected));
}

#[test]
fn test_unrecognized_keyword_and_command() {
    let db = TestDb::new();
    let output = db.run(&["update 1 a", ".quit"]);

    assert_eq!(
        output,
        lines(&[
            "db > Unrecognized keyword at start of 'update 1 a'.",
            "db > Unrecognized command '.quit'.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_line_that_is_not_utf8() {
    let db = TestDb::new();
    let output = db.run_bytes(b"insert 1 keep\nselect \xff\xfe\ninsert 2 also\n.exit\n");

    assert_eq!(
        output,
        lines(&[
            "db > Executed.",
            "db > Syntax error. Could not parse statement.",
            "db > Executed.",
            "db > bye~",
        ])
    );

    let rows = db.open_table().select(None).expect("select");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].value.as_str(), "also");
}
