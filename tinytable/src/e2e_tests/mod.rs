//! End-to-end tests at the shell input/output level.
//!
//! Each test file covers one scenario, feeding a fixed script of input lines
//! through a [`crate::Shell`] and comparing the exact output.

#![cfg(test)]

mod helpers;

mod test_delete;
mod test_duplicate_key;
mod test_input_validation;
mod test_insert_select;
mod test_meta_commands;
mod test_persistence;
mod test_splits;
