//! In-memory reference model of a table.

use std::collections::BTreeMap;

use crate::types::Row;

/// What the table should contain, kept as a plain ordered map.
#[derive(Debug, Default)]
pub struct Model {
    rows: BTreeMap<u32, String>,
}

impl Model {
    /// Insert unless the key exists. Returns whether the row was added.
    pub fn insert(&mut self, key: u32, value: &str) -> bool {
        if self.rows.contains_key(&key) {
            return false;
        }
        self.rows.insert(key, value.to_string());
        true
    }

    /// Remove every row with `value`. Returns the number removed.
    pub fn delete(&mut self, value: &str) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, v| v != value);
        before - self.rows.len()
    }

    /// Rows in key order, optionally filtered by value.
    #[must_use]
    pub fn select(&self, filter: Option<&str>) -> Vec<(u32, String)> {
        self.rows
            .iter()
            .filter(|(_, v)| filter.is_none_or(|f| v.as_str() == f))
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }

    #[must_use]
    pub fn get(&self, key: u32) -> Option<&str> {
        self.rows.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A disagreement between the table and the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Insert succeeded when it should have been rejected, or the reverse.
    InsertOutcome { step: usize, key: u32, accepted: bool },
    DeleteCount {
        step: usize,
        expected: usize,
        actual: usize,
    },
    /// A scan returned different rows.
    Rows {
        step: usize,
        expected: usize,
        actual: usize,
    },
    Get { step: usize, key: u32 },
    /// The tree failed its structural checks.
    Structure { step: usize, error: String },
    /// A storage call failed outright.
    Storage { step: usize, error: String },
}

/// Convert table rows into the model's representation.
#[must_use]
pub fn to_pairs(rows: &[Row]) -> Vec<(u32, String)> {
    rows.iter()
        .map(|row| (row.key, row.value.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_semantics() {
        let mut model = Model::default();
        assert!(model.insert(2, "a"));
        assert!(model.insert(1, "b"));
        assert!(!model.insert(2, "c"));

        assert_eq!(model.select(None), vec![(1, "b".to_string()), (2, "a".to_string())]);
        assert_eq!(model.select(Some("a")), vec![(2, "a".to_string())]);
        assert_eq!(model.get(2), Some("a"));

        assert_eq!(model.delete("a"), 1);
        assert_eq!(model.len(), 1);
        assert!(!model.is_empty());
        assert_eq!(model.get(2), None);
    }
}
