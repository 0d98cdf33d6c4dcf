//! Turning a line of input into a typed command.
//!
//! Lines starting with `.` are meta-commands; everything else is a statement
//! whose first whitespace-separated word is the keyword.

use crate::types::{Row, RowError, Value};

/// Shell-level commands that do not touch rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    /// Flush the table and stop.
    Exit,
    /// Print the tree structure.
    Btree,
    /// Print page layout constants.
    Constants,
}

/// A statement run against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    /// Full scan, optionally keeping only rows whose value matches.
    Select(Option<Value>),
    Delete(Value),
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    Meta(MetaCommand),
    Statement(Statement),
}

/// Parse one input line, without its trailing newline.
pub fn parse(line: &str) -> Result<Command, PrepareError> {
    if line.starts_with('.') {
        return parse_meta(line).map(Command::Meta);
    }

    let mut tokens = line.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return Ok(Command::Empty);
    };
    let args: Vec<&str> = tokens.collect();

    let statement = match keyword {
        "insert" => parse_insert(&args)?,
        "select" => match args.as_slice() {
            [] => Statement::Select(None),
            [value] => Statement::Select(Some(parse_value(value)?)),
            _ => return Err(PrepareError::SyntaxError),
        },
        // Deleting without a filter would empty the table, so it is not accepted
        "delete" => match args.as_slice() {
            [value] => Statement::Delete(parse_value(value)?),
            _ => return Err(PrepareError::SyntaxError),
        },
        _ => return Err(PrepareError::UnrecognizedStatement(line.to_owned())),
    };
    Ok(Command::Statement(statement))
}

fn parse_meta(line: &str) -> Result<MetaCommand, PrepareError> {
    match line.trim_end() {
        ".exit" => Ok(MetaCommand::Exit),
        ".btree" => Ok(MetaCommand::Btree),
        ".constants" => Ok(MetaCommand::Constants),
        _ => Err(PrepareError::UnrecognizedCommand(line.to_owned())),
    }
}

fn parse_insert(args: &[&str]) -> Result<Statement, PrepareError> {
    let [key, value] = args else {
        return Err(PrepareError::SyntaxError);
    };
    let key = parse_key(key)?;
    let value = parse_value(value)?;
    Ok(Statement::Insert(Row { key, value }))
}

fn parse_key(token: &str) -> Result<u32, PrepareError> {
    let key: i64 = token.parse().map_err(|_| PrepareError::SyntaxError)?;
    if key < 0 {
        return Err(PrepareError::NegativeKey);
    }
    u32::try_from(key).map_err(|_| PrepareError::SyntaxError)
}

fn parse_value(token: &str) -> Result<Value, PrepareError> {
    Value::new(token).map_err(|e| match e {
        RowError::ValueTooLong(_) => PrepareError::ValueTooLong,
        RowError::NulByte | RowError::InvalidUtf8 => PrepareError::SyntaxError,
    })
}

/// Reasons a line could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    NegativeKey,
    ValueTooLong,
    /// Wrong number of arguments or a key that is not a `u32`.
    SyntaxError,
    UnrecognizedStatement(String),
    UnrecognizedCommand(String),
}

impl std::fmt::Display for PrepareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeKey => write!(f, "Column key must be non-negative."),
            Self::ValueTooLong => write!(f, "String for column value is too long."),
            Self::SyntaxError => write!(f, "Syntax error. Could not parse statement."),
            Self::UnrecognizedStatement(line) => {
                write!(f, "Unrecognized keyword at start of '{line}'.")
            }
            Self::UnrecognizedCommand(line) => write!(f, "Unrecognized command '{line}'."),
        }
    }
}

impl std::error::Error for PrepareError {}
