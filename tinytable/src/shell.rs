//! Read-eval loop over a table.
//!
//! The shell is generic over its input and output so tests can drive it with
//! in-memory buffers. Only shell output goes to `output`; diagnostics go
//! through `tracing`.

use std::io::{BufRead, Write};

use crate::command::{self, Command, MetaCommand, PrepareError, Statement};
use crate::config::ShellConfig;
use crate::storage::btree::{
    INTERNAL_CELL_SIZE, INTERNAL_HEADER_SIZE, INTERNAL_MAX_KEYS, LEAF_CELL_SIZE, LEAF_HEADER_SIZE,
    LEAF_MAX_CELLS, NODE_HEADER_SIZE, TreeError,
};
use crate::storage::{PAGE_SIZE, Table, TableError};
use crate::types::{ROW_SIZE, Row};

/// Whether the loop should keep reading after a line.
enum Flow {
    Continue,
    Exit,
}

/// An interactive command shell.
pub struct Shell<R, W> {
    input: R,
    output: W,
    config: ShellConfig,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub const fn new(input: R, output: W, config: ShellConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    /// Run until `.exit` or end of input, then flush and close the table.
    ///
    /// The table is flushed even if reading or writing fails part way.
    pub fn run(&mut self, mut table: Table) -> Result<(), ShellError> {
        let outcome = self.read_eval(&mut table);
        let closed = table.close();
        if let (Err(_), Err(e)) = (&outcome, &closed) {
            tracing::error!("flush after failed session: {e}");
        }
        outcome?;

        let written = closed?;
        tracing::debug!("wrote {written} pages on exit");
        writeln!(self.output, "bye~")?;
        self.output.flush()?;
        Ok(())
    }

    fn read_eval(&mut self, table: &mut Table) -> Result<(), ShellError> {
        let mut buf = Vec::new();
        loop {
            write!(self.output, "{}", self.config.prompt)?;
            self.output.flush()?;

            buf.clear();
            if self.input.read_until(b'\n', &mut buf)? == 0 {
                tracing::debug!("end of input");
                return Ok(());
            }
            let mut line = buf.as_slice();
            while let [rest @ .., b'\n' | b'\r'] = line {
                line = rest;
            }

            if line.len() > self.config.max_input_len {
                writeln!(self.output, "Input is too long.")?;
                continue;
            }
            let Ok(input) = std::str::from_utf8(line) else {
                tracing::debug!("rejected input that is not UTF-8");
                writeln!(self.output, "{}", PrepareError::SyntaxError)?;
                continue;
            };

            if matches!(self.execute(input, table)?, Flow::Exit) {
                return Ok(());
            }
        }
    }

    /// Consume the shell and return its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn execute(&mut self, input: &str, table: &mut Table) -> Result<Flow, ShellError> {
        let command = match command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                writeln!(self.output, "{e}")?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Empty => {}
            Command::Meta(MetaCommand::Exit) => return Ok(Flow::Exit),
            Command::Meta(MetaCommand::Btree) => match table.render() {
                Ok(tree) => writeln!(self.output, "Tree:\n{tree}")?,
                Err(e) => self.report(&e)?,
            },
            Command::Meta(MetaCommand::Constants) => self.print_constants()?,
            Command::Statement(statement) => self.execute_statement(statement, table)?,
        }
        Ok(Flow::Continue)
    }

    fn execute_statement(
        &mut self,
        statement: Statement,
        table: &mut Table,
    ) -> Result<(), ShellError> {
        // Only selects produce rows to print
        let result = match statement {
            Statement::Insert(row) => table.insert(&row).map(|()| None),
            Statement::Select(filter) => table.select(filter.as_ref()).map(Some),
            Statement::Delete(filter) => table.delete(&filter).map(|removed| {
                tracing::debug!("delete removed {removed} rows");
                None
            }),
        };

        match result {
            Ok(rows) => {
                if let Some(rows) = rows {
                    self.print_rows(&rows)?;
                }
                writeln!(self.output, "Executed.")?;
            }
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    fn print_rows(&mut self, rows: &[Row]) -> Result<(), ShellError> {
        if rows.is_empty() {
            writeln!(self.output, "(no rows)")?;
        }
        for row in rows {
            writeln!(self.output, "{row}")?;
        }
        Ok(())
    }

    fn report(&mut self, error: &TableError) -> Result<(), ShellError> {
        if let TableError::Tree(TreeError::DuplicateKey(key)) = error {
            tracing::debug!("rejected duplicate key {key}");
            writeln!(self.output, "Error: Duplicate key.")?;
        } else {
            tracing::warn!("command failed: {error}");
            writeln!(self.output, "Error: {error}")?;
        }
        Ok(())
    }

    fn print_constants(&mut self) -> Result<(), ShellError> {
        let constants = [
            ("PAGE_SIZE", PAGE_SIZE),
            ("ROW_SIZE", ROW_SIZE),
            ("COMMON_NODE_HEADER_SIZE", NODE_HEADER_SIZE),
            ("LEAF_NODE_HEADER_SIZE", LEAF_HEADER_SIZE),
            ("LEAF_NODE_CELL_SIZE", LEAF_CELL_SIZE),
            ("LEAF_NODE_SPACE_FOR_CELLS", PAGE_SIZE - LEAF_HEADER_SIZE),
            ("LEAF_NODE_MAX_CELLS", LEAF_MAX_CELLS),
            ("INTERNAL_NODE_HEADER_SIZE", INTERNAL_HEADER_SIZE),
            ("INTERNAL_NODE_CELL_SIZE", INTERNAL_CELL_SIZE),
            ("INTERNAL_NODE_MAX_KEYS", INTERNAL_MAX_KEYS),
        ];

        writeln!(self.output, "Constants:")?;
        for (name, value) in constants {
            writeln!(self.output, "{name}: {value}")?;
        }
        Ok(())
    }
}

/// Errors that stop the shell.
#[derive(Debug)]
pub enum ShellError {
    /// Reading input or writing output failed.
    Io(std::io::Error),
    /// The table could not be flushed on exit.
    Table(TableError),
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Table(e) => write!(f, "table error: {e}"),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Table(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ShellError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TableError> for ShellError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}
