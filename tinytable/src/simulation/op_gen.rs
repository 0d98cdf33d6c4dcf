//! Reproducible random operation streams.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Values drawn for inserts and filters. A small pool makes filters and
/// deletes hit many rows.
const VALUES: [&str; 6] = ["a", "b", "c", "dd", "eee", "abcdefghijk"];

/// One step of a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Insert { key: u32, value: String },
    Delete { value: String },
    Select { filter: Option<String> },
    Get { key: u32 },
    /// Close the table (flushing it) and open it again.
    Reopen,
}

/// Relative weights of each operation kind.
#[derive(Debug, Clone)]
pub struct OpGenConfig {
    /// Keys are drawn from `0..key_space`; a small space forces duplicates.
    pub key_space: u32,
    pub insert_weight: u32,
    pub delete_weight: u32,
    pub select_weight: u32,
    pub get_weight: u32,
    pub reopen_weight: u32,
}

impl Default for OpGenConfig {
    fn default() -> Self {
        Self {
            key_space: 2_000,
            insert_weight: 70,
            delete_weight: 3,
            select_weight: 10,
            get_weight: 15,
            reopen_weight: 2,
        }
    }
}

/// Generates operations from a seed.
pub struct OpGenerator {
    rng: StdRng,
    config: OpGenConfig,
}

impl OpGenerator {
    #[must_use]
    pub fn new(seed: u64, config: OpGenConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    fn value(&mut self) -> String {
        VALUES[self.rng.random_range(0..VALUES.len())].to_string()
    }

    /// Draw the next operation.
    pub fn next_op(&mut self) -> Operation {
        let c = self.config.clone();
        let total =
            c.insert_weight + c.delete_weight + c.select_weight + c.get_weight + c.reopen_weight;
        let mut pick = self.rng.random_range(0..total);

        if pick < c.insert_weight {
            let key = self.rng.random_range(0..c.key_space);
            return Operation::Insert {
                key,
                value: self.value(),
            };
        }
        pick -= c.insert_weight;

        if pick < c.delete_weight {
            return Operation::Delete {
                value: self.value(),
            };
        }
        pick -= c.delete_weight;

        if pick < c.select_weight {
            let filter = self.rng.random_bool(0.5).then(|| self.value());
            return Operation::Select { filter };
        }
        pick -= c.select_weight;

        if pick < c.get_weight {
            let key = self.rng.random_range(0..c.key_space);
            return Operation::Get { key };
        }

        Operation::Reopen
    }
}
