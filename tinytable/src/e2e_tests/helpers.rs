//! Common helpers for end-to-end tests.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::config::ShellConfig;
use crate::shell::{Shell, ShellError};
use crate::storage::Table;
use crate::storage::btree::NodeLimits;

/// Prompt used by every test shell; short so expected output stays readable.
pub const PROMPT: &str = "db > ";

/// A table file in its own temporary directory, removed on drop.
pub struct TestDb {
    _dir: TempDir,
    path: PathBuf,
    config: ShellConfig,
}

impl TestDb {
    /// A fresh table with page-capacity split limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(NodeLimits::default())
    }

    /// A fresh table that splits nodes at the given sizes.
    #[must_use]
    pub fn with_limits(limits: NodeLimits) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let config = ShellConfig {
            prompt: PROMPT.to_string(),
            limits,
            ..ShellConfig::default()
        };
        Self {
            _dir: dir,
            path,
            config,
        }
    }

    /// Run one shell session over `lines` and return its output, line by line.
    ///
    /// The session ends at `.exit` or after the last line, flushing the table
    /// either way.
    pub fn run(&self, lines: &[&str]) -> Vec<String> {
        let input: String = lines.iter().map(|line| format!("{line}\n")).collect();
        self.run_bytes(input.as_bytes())
    }

    /// Like [`Self::run`], for input that need not be valid UTF-8.
    pub fn run_bytes(&self, input: &[u8]) -> Vec<String> {
        let mut output = Vec::new();
        self.run_with_output(input, &mut output)
            .expect("shell session");

        String::from_utf8(output)
            .expect("utf-8 output")
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Run one session writing to `output`, returning how it ended.
    pub fn run_with_output<W: Write>(&self, input: &[u8], output: W) -> Result<(), ShellError> {
        let table = self.open_table();
        Shell::new(input, output, self.config.clone()).run(table)
    }

    /// Open the table directly, bypassing the shell.
    pub fn open_table(&self) -> Table {
        Table::open_with_limits(&self.path, self.config.limits).expect("open table")
    }
}

/// Expected output for `lines` that each print `Executed.` and nothing else,
/// followed by the farewell after end of input.
pub fn executed_then_bye(count: usize) -> Vec<String> {
    let mut expected: Vec<String> = (0..count).map(|_| format!("{PROMPT}Executed.")).collect();
    expected.push(format!("{PROMPT}bye~"));
    expected
}

/// Owned copies of string literals, for comparing against shell output.
pub fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| (*line).to_owned()).collect()
}
