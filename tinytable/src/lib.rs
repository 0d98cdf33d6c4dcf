// Production code propagates errors; tests may expect() and unwrap() freely.
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

//! A single-file B+tree key-value table with a line-oriented command shell.
//!
//! Data flow for one command:
//! 1. The shell reads a line and [`command::parse`] turns it into a typed command
//! 2. [`storage::Table`] runs it against a B+tree borrowed from its pager
//! 3. On exit the pager writes every modified page back to the file

pub mod command;
pub mod config;
pub mod shell;
pub mod storage;
pub mod types;

mod e2e_tests;
mod simulation;

pub use config::{ConfigError, ShellConfig};
pub use shell::{Shell, ShellError};
pub use storage::{Table, TableError};
