//! Data written in one session is visible in the next.

use std::io::{self, Write};

use crate::e2e_tests::helpers::{TestDb, lines};
use crate::shell::ShellError;
use crate::storage::btree::NodeLimits;

/// Output that accepts `remaining` bytes and then fails every write.
struct ClosingOutput {
    remaining: usize,
}

impl Write for ClosingOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.remaining {
            return Err(io::Error::other("output closed"));
        }
        self.remaining -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_rows_survive_exit() {
    let db = TestDb::new();
    db.run(&["insert 1 user1", "insert 2 user2", ".exit"]);

    let output = db.run(&["select", ".exit"]);
    assert_eq!(
        output,
        lines(&[
            "db > (1, user1)",
            "(2, user2)",
            "Executed.",
            "db > bye~",
        ])
    );
}

#[test]
fn test_end_of_input_flushes_like_exit() {
    let db = TestDb::new();
    db.run(&["insert 5 five"]);

    let output = db.run(&["select"]);
    assert_eq!(output[0], "db > (5, five)");
}

#[test]
fn test_multi_level_tree_survives_reopen() {
    let db = TestDb::with_limits(NodeLimits::new(4, 3));
    let keys: Vec<u32> = (0..80).map(|i| (i * 37) % 101).collect();
    let script: Vec<String> = keys.iter().map(|key| format!("insert {key} k{key}")).collect();
    let script: Vec<&str> = script.iter().map(String::as_str).collect();
    db.run(&script);

    let first = db.open_table().select(None).expect("select");
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(first.iter().map(|row| row.key).collect::<Vec<_>>(), sorted);

    // A second session sees the same tree and can keep growing it
    db.run(&["insert 1000 late"]);
    let mut table = db.open_table();
    let rows = table.select(None).expect("select");
    assert_eq!(rows.len(), 81);
    assert_eq!(rows[..80], first[..]);
    assert!(table.stats().expect("valid tree").height >= 3);
}

#[test]
fn test_rows_flushed_when_output_fails() {
    let db = TestDb::new();
    // Room for two "db > Executed." lines and the next prompt only
    let output = ClosingOutput { remaining: 35 };
    let result = db.run_with_output(b"insert 1 a\ninsert 2 b\ninsert 3 c\n", output);
    assert!(matches!(result, Err(ShellError::Io(_))));

    let keys: Vec<u32> = db
        .open_table()
        .select(None)
        .expect("select")
        .iter()
        .map(|row| row.key)
        .collect();
    assert_eq!(keys, vec![1, 2, 3]);
}
