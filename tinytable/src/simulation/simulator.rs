//! Main simulator harness.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::storage::btree::{NodeLimits, TreeError};
use crate::storage::{Table, TableError};
use crate::types::{Row, Value};

use super::model::{Mismatch, Model, to_pairs};
use super::op_gen::{OpGenConfig, OpGenerator, Operation};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Split thresholds for the table under test.
    pub limits: NodeLimits,
    pub op_config: OpGenConfig,
}

impl SimulatorConfig {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            limits: NodeLimits::default(),
            op_config: OpGenConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: NodeLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_op_config(mut self, op_config: OpGenConfig) -> Self {
        self.op_config = op_config;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    pub seed: u64,
    /// Every operation applied, in order.
    pub operations: Vec<Operation>,
    /// Rows in the table when the run ended.
    pub final_rows: usize,
    /// Tallest the tree got during the run.
    pub max_height: usize,
    pub violations: Vec<Mismatch>,
}

impl SimulationResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Applies generated operations to a table and a model in lockstep.
pub struct Simulator {
    config: SimulatorConfig,
    generator: OpGenerator,
    model: Model,
    _dir: TempDir,
    path: PathBuf,
}

impl Simulator {
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(format!("sim_{}.db", config.seed));
        let generator = OpGenerator::new(config.seed, config.op_config.clone());

        Self {
            config,
            generator,
            model: Model::default(),
            _dir: dir,
            path,
        }
    }

    fn open(&self) -> Table {
        Table::open_with_limits(&self.path, self.config.limits).expect("open table")
    }

    /// Run `op_count` operations, stopping at the first mismatch.
    pub fn run(&mut self, op_count: usize) -> SimulationResult {
        let mut table = Some(self.open());
        let mut operations = Vec::with_capacity(op_count);
        let mut violations = Vec::new();
        let mut max_height = 0;

        for step in 0..op_count {
            let op = self.generator.next_op();
            operations.push(op.clone());

            let Some(current) = table.take() else {
                break;
            };
            let (next, result) = self.apply(step, current, &op);
            table = Some(next);

            let outcome = result.and_then(|()| {
                let table = table.as_mut().expect("table is open");
                let stats = table.stats().map_err(|e| Mismatch::Structure {
                    step,
                    error: e.to_string(),
                })?;
                if stats.row_count != self.model.len() {
                    return Err(Mismatch::Rows {
                        step,
                        expected: self.model.len(),
                        actual: stats.row_count,
                    });
                }
                max_height = max_height.max(stats.height);
                Ok(())
            });

            if let Err(mismatch) = outcome {
                tracing::error!("seed {}: {mismatch:?} after {op:?}", self.config.seed);
                violations.push(mismatch);
                break;
            }
        }

        let final_rows = self.model.len();
        if let Some(table) = table {
            table.close().expect("close table");
        }

        SimulationResult {
            seed: self.config.seed,
            operations,
            final_rows,
            max_height,
            violations,
        }
    }

    /// Apply one operation to both sides. Returns the (possibly reopened) table.
    fn apply(&mut self, step: usize, mut table: Table, op: &Operation) -> (Table, Result<(), Mismatch>) {
        let storage = |e: TableError| Mismatch::Storage {
            step,
            error: e.to_string(),
        };

        let result = match op {
            Operation::Insert { key, value } => {
                let row = Row::new(*key, value).expect("generated value is valid");
                let expected = self.model.insert(*key, value);
                let accepted = match table.insert(&row) {
                    Ok(()) => Ok(true),
                    Err(TableError::Tree(TreeError::DuplicateKey(_))) => Ok(false),
                    Err(e) => Err(storage(e)),
                };
                match accepted {
                    Ok(accepted) if accepted != expected => Err(Mismatch::InsertOutcome {
                        step,
                        key: *key,
                        accepted,
                    }),
                    other => other.map(|_| ()),
                }
            }
            Operation::Delete { value } => {
                let filter = Value::new(value).expect("generated value is valid");
                let expected = self.model.delete(value);
                match table.delete(&filter) {
                    Ok(actual) if actual == expected => Ok(()),
                    Ok(actual) => Err(Mismatch::DeleteCount {
                        step,
                        expected,
                        actual,
                    }),
                    Err(e) => Err(storage(e)),
                }
            }
            Operation::Select { filter } => {
                let filter_value = filter
                    .as_deref()
                    .map(|v| Value::new(v).expect("generated value is valid"));
                let expected = self.model.select(filter.as_deref());
                match table.select(filter_value.as_ref()) {
                    Ok(rows) if to_pairs(&rows) == expected => Ok(()),
                    Ok(rows) => Err(Mismatch::Rows {
                        step,
                        expected: expected.len(),
                        actual: rows.len(),
                    }),
                    Err(e) => Err(storage(e)),
                }
            }
            Operation::Get { key } => match table.get(*key) {
                Ok(row) if row.as_ref().map(|r| r.value.as_str()) == self.model.get(*key) => Ok(()),
                Ok(_) => Err(Mismatch::Get { step, key: *key }),
                Err(e) => Err(storage(e)),
            },
            Operation::Reopen => {
                if let Err(e) = table.close() {
                    // The table is gone; reopen what made it to disk
                    return (self.open(), Err(storage(e)));
                }
                table = self.open();
                Ok(())
            }
        };

        (table, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_basic() {
        let mut sim = Simulator::new(SimulatorConfig::new(12345));
        let result = sim.run(500);

        assert!(result.passed(), "violations: {:?}", result.violations);
        assert_eq!(result.operations.len(), 500);
        assert!(result.final_rows > 0);
    }

    #[test]
    fn test_simulator_deterministic() {
        let config = SimulatorConfig::new(42).with_limits(NodeLimits::new(3, 3));
        let first = Simulator::new(config.clone()).run(300);
        let second = Simulator::new(config).run(300);

        assert_eq!(first.operations, second.operations);
        assert_eq!(first.final_rows, second.final_rows);
        assert_eq!(first.max_height, second.max_height);
    }

    #[test]
    fn test_simulator_small_nodes_many_seeds() {
        for seed in 0..20 {
            let config = SimulatorConfig::new(seed).with_limits(NodeLimits::new(2, 2));
            let result = Simulator::new(config).run(400);
            assert!(
                result.passed(),
                "seed {seed} failed: {:?}",
                result.violations
            );
        }
    }

    #[test]
    fn test_simulator_deep_tree() {
        let op_config = OpGenConfig {
            key_space: 100_000,
            delete_weight: 1,
            reopen_weight: 1,
            ..OpGenConfig::default()
        };
        let config = SimulatorConfig::new(7)
            .with_limits(NodeLimits::new(4, 3))
            .with_op_config(op_config);
        let result = Simulator::new(config).run(1500);

        assert!(result.passed(), "violations: {:?}", result.violations);
        assert!(result.max_height >= 4, "tree stayed shallow: {}", result.max_height);
    }

    #[test]
    fn test_simulator_duplicate_heavy() {
        let op_config = OpGenConfig {
            key_space: 30,
            ..OpGenConfig::default()
        };
        let config = SimulatorConfig::new(99)
            .with_limits(NodeLimits::new(3, 2))
            .with_op_config(op_config);
        let result = Simulator::new(config).run(600);

        assert!(result.passed(), "violations: {:?}", result.violations);
        assert!(result.final_rows <= 30);
    }
}
