//! Shell configuration module.
//!
//! Configuration is read from environment variables; every variable is
//! optional.
//!
//! # Environment Variables
//!
//! - `TINYTABLE_PROMPT`: Prompt printed before each input line (default: `tinytable> `)
//! - `TINYTABLE_MAX_INPUT_LEN`: Longest accepted input line in bytes (default: `31`)
//! - `TINYTABLE_LEAF_MAX_CELLS`: Cells per leaf before it splits (default: page capacity)
//! - `TINYTABLE_INTERNAL_MAX_KEYS`: Keys per internal node before it splits (default: page capacity)
//!
//! # Invariants
//!
//! - `max_input_len` is at least 1
//! - `limits` always passes [`NodeLimits::is_valid`]

use crate::storage::btree::{INTERNAL_MAX_KEYS, LEAF_MAX_CELLS, NodeLimits};

/// Shell configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Printed before reading each line.
    pub prompt: String,
    /// Lines longer than this are rejected without being parsed.
    pub max_input_len: usize,
    /// Split thresholds for the table.
    pub limits: NodeLimits,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: Self::DEFAULT_PROMPT.to_string(),
            max_input_len: Self::DEFAULT_MAX_INPUT_LEN,
            limits: NodeLimits::default(),
        }
    }
}

impl ShellConfig {
    /// Default prompt.
    pub const DEFAULT_PROMPT: &'static str = "tinytable> ";
    /// Default maximum input line length in bytes.
    pub const DEFAULT_MAX_INPUT_LEN: usize = 31;

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prompt = lookup("TINYTABLE_PROMPT").unwrap_or_else(|| Self::DEFAULT_PROMPT.to_string());
        let max_input_len = load_usize(
            &lookup,
            "TINYTABLE_MAX_INPUT_LEN",
            Self::DEFAULT_MAX_INPUT_LEN,
            1..=usize::MAX,
        )?;
        let leaf_max_cells = load_usize(
            &lookup,
            "TINYTABLE_LEAF_MAX_CELLS",
            LEAF_MAX_CELLS,
            NodeLimits::MIN..=LEAF_MAX_CELLS,
        )?;
        let internal_max_keys = load_usize(
            &lookup,
            "TINYTABLE_INTERNAL_MAX_KEYS",
            INTERNAL_MAX_KEYS,
            NodeLimits::MIN..=INTERNAL_MAX_KEYS,
        )?;

        Ok(Self {
            prompt,
            max_input_len,
            limits: NodeLimits::new(leaf_max_cells, internal_max_keys),
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn load_usize<F>(
    lookup: &F,
    name: &str,
    default: usize,
    range: std::ops::RangeInclusive<usize>,
) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };

    match value.trim().parse::<usize>() {
        Ok(parsed) if range.contains(&parsed) => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!(
                "'{value}' is not a number in {}..={}",
                range.start(),
                range.end()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<ShellConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ShellConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_vars(&[]).expect("defaults");
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.prompt, "tinytable> ");
        assert_eq!(config.max_input_len, 31);
        assert_eq!(config.limits, NodeLimits::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("TINYTABLE_PROMPT", "db> "),
            ("TINYTABLE_MAX_INPUT_LEN", "64"),
            ("TINYTABLE_LEAF_MAX_CELLS", "3"),
            ("TINYTABLE_INTERNAL_MAX_KEYS", " 4 "),
        ])
        .expect("valid config");

        assert_eq!(config.prompt, "db> ");
        assert_eq!(config.max_input_len, 64);
        assert_eq!(config.limits, NodeLimits::new(3, 4));
    }

    #[test]
    fn test_invalid_values() {
        let err = from_vars(&[("TINYTABLE_MAX_INPUT_LEN", "0")]).expect_err("zero length");
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "TINYTABLE_MAX_INPUT_LEN"));

        assert!(from_vars(&[("TINYTABLE_LEAF_MAX_CELLS", "1")]).is_err());
        assert!(from_vars(&[("TINYTABLE_LEAF_MAX_CELLS", "256")]).is_err());
        assert!(from_vars(&[("TINYTABLE_INTERNAL_MAX_KEYS", "many")]).is_err());
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
