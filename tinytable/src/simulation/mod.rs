//! Deterministic simulation testing for the table engine.
//!
//! A seeded generator produces a stream of inserts, deletes, scans, point
//! lookups and close/reopen cycles. Each operation runs against a real
//! [`crate::storage::Table`] and an in-memory model; after every step the
//! two must agree and the tree must pass its structural checks.
//!
//! # Usage
//!
//! ```ignore
//! let config = SimulatorConfig::new(12345).with_limits(NodeLimits::new(3, 3));
//! let result = Simulator::new(config).run(1000);
//! assert!(result.passed(), "{:?}", result.violations);
//! ```

#![cfg(test)]

mod model;
mod op_gen;
mod simulator;

pub use model::{Mismatch, Model, to_pairs};
pub use op_gen::{OpGenConfig, OpGenerator, Operation};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
