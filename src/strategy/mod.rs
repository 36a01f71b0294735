//! Field-level sanitization strategies
//!
//! Every strategy is a pure function from one field value to its sanitized
//! replacement. Column rules name an [`Operation`] per column; operations are
//! resolved to concrete [`Strategy`] values once, when a sanitization stage
//! is built, so no lookup or dispatch table is consulted per record.
//!
//! - [`mask`] - partial masking with email and phone awareness
//! - [`hash`] - hex digest of the value (SHA-2 family)
//! - [`nullify`] - constant replacement
//! - [`randomize`] - deterministic synthetic values of the same shape

pub mod hash;
pub mod mask;
pub mod nullify;
pub mod randomize;

pub use hash::{HashAlgorithm, HashStrategy};
pub use mask::MaskStrategy;
pub use nullify::NullifyStrategy;
pub use randomize::{RandomizeStrategy, ValueShape};

use crate::config::SanitizerConfig;
use crate::error::{Result, SanitizerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sanitization operation named by a column rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operation {
    Mask,
    Hash,
    Nullify,
    Randomize,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Mask,
        Operation::Hash,
        Operation::Nullify,
        Operation::Randomize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Mask => "MASK",
            Operation::Hash => "HASH",
            Operation::Nullify => "NULLIFY",
            Operation::Randomize => "RANDOMIZE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = SanitizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MASK" => Ok(Operation::Mask),
            "HASH" => Ok(Operation::Hash),
            "NULLIFY" => Ok(Operation::Nullify),
            "RANDOMIZE" => Ok(Operation::Randomize),
            other => Err(SanitizerError::configuration(format!(
                "Unknown sanitization operation '{}' (expected one of MASK, HASH, NULLIFY, RANDOMIZE)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = SanitizerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        operation.as_str().to_string()
    }
}

/// Column name to operation mapping for one run
///
/// Serialized as `{"columns": {"email": "MASK"}}`, the shape accepted by the
/// job submission boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRules {
    columns: BTreeMap<String, Operation>,
}

impl ColumnRules {
    /// Build a rule set; an empty set is rejected
    pub fn new<I, K>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Operation)>,
        K: Into<String>,
    {
        let columns: BTreeMap<String, Operation> = rules
            .into_iter()
            .map(|(column, operation)| (column.into(), operation))
            .collect();
        let rules = Self { columns };
        rules.validate()?;
        Ok(rules)
    }

    /// Parse rules from their JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: Self = serde_json::from_str(json).map_err(|e| {
            SanitizerError::configuration(format!("Invalid column rules: {}", e))
        })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load rules from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Err(SanitizerError::not_found(path));
        }
        let json = std::fs::read_to_string(path).map_err(|e| {
            SanitizerError::io(format!("Failed to read rules file {}", path.display()), e)
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(SanitizerError::configuration(
                "At least one column rule is required",
            ));
        }
        if let Some(column) = self.columns.keys().find(|c| c.trim().is_empty()) {
            return Err(SanitizerError::configuration(format!(
                "Column rule has an empty column name: '{}'",
                column
            )));
        }
        Ok(())
    }

    pub fn get(&self, column: &str) -> Option<Operation> {
        self.columns.get(column).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Operation)> {
        self.columns.iter().map(|(c, op)| (c.as_str(), *op))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Compact `column=OPERATION` listing for logs and reports
    pub fn describe(&self) -> String {
        self.columns
            .iter()
            .map(|(column, operation)| format!("{}={}", column, operation))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A configured strategy ready to transform values
#[derive(Debug, Clone)]
pub enum Strategy {
    Mask(MaskStrategy),
    Hash(HashStrategy),
    Nullify(NullifyStrategy),
    Randomize(RandomizeStrategy),
}

impl Strategy {
    /// Resolve an operation using the strategy settings from `config`
    pub fn for_operation(operation: Operation, config: &SanitizerConfig) -> Self {
        match operation {
            Operation::Mask => {
                Strategy::Mask(MaskStrategy::new(config.mask_char, config.mask_visible_chars))
            }
            Operation::Hash => Strategy::Hash(HashStrategy::new(config.hash_algorithm)),
            Operation::Nullify => {
                Strategy::Nullify(NullifyStrategy::new(config.null_replacement.clone()))
            }
            Operation::Randomize => Strategy::Randomize(RandomizeStrategy::new()),
        }
    }

    /// Transform a present field value
    pub fn transform(&self, value: &str) -> String {
        match self {
            Strategy::Mask(s) => s.apply(value),
            Strategy::Hash(s) => s.apply(value),
            Strategy::Nullify(s) => s.apply(value),
            Strategy::Randomize(s) => s.apply(value),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Strategy::Mask(_) => Operation::Mask,
            Strategy::Hash(_) => Operation::Hash,
            Strategy::Nullify(_) => Operation::Nullify,
            Strategy::Randomize(_) => Operation::Randomize,
        }
    }

    /// Display name, e.g. `HASH(SHA-256)`
    pub fn name(&self) -> String {
        match self {
            Strategy::Hash(s) => format!("HASH({})", s.algorithm()),
            other => other.operation().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing_is_case_insensitive() {
        assert_eq!("mask".parse::<Operation>().unwrap(), Operation::Mask);
        assert_eq!(" Hash ".parse::<Operation>().unwrap(), Operation::Hash);
        assert_eq!("NULLIFY".parse::<Operation>().unwrap(), Operation::Nullify);
        assert_eq!("randomize".parse::<Operation>().unwrap(), Operation::Randomize);
    }

    #[test]
    fn test_unknown_operation_is_configuration_error() {
        let err = "ENCRYPT".parse::<Operation>().unwrap_err();
        assert!(matches!(err, SanitizerError::Configuration { .. }));
        assert!(err.to_string().contains("ENCRYPT"));
    }

    #[test]
    fn test_column_rules_from_json() {
        let rules =
            ColumnRules::from_json(r#"{"columns": {"email": "MASK", "ssn": "hash"}}"#).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("email"), Some(Operation::Mask));
        assert_eq!(rules.get("ssn"), Some(Operation::Hash));
        assert_eq!(rules.get("name"), None);
        assert_eq!(rules.describe(), "email=MASK, ssn=HASH");
    }

    #[test]
    fn test_column_rules_reject_empty_and_unknown() {
        let empty = ColumnRules::from_json(r#"{"columns": {}}"#).unwrap_err();
        assert!(matches!(empty, SanitizerError::Configuration { .. }));

        let unknown = ColumnRules::from_json(r#"{"columns": {"email": "SCRAMBLE"}}"#).unwrap_err();
        assert!(matches!(unknown, SanitizerError::Configuration { .. }));

        let no_rules = ColumnRules::new(Vec::<(String, Operation)>::new()).unwrap_err();
        assert!(matches!(no_rules, SanitizerError::Configuration { .. }));
    }

    #[test]
    fn test_column_rules_round_trip_uses_operation_names() {
        let rules = ColumnRules::new([("phone", Operation::Randomize)]).unwrap();
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(json, r#"{"columns":{"phone":"RANDOMIZE"}}"#);
    }

    #[test]
    fn test_strategy_resolution() {
        let config = SanitizerConfig::default();
        for operation in Operation::ALL {
            let strategy = Strategy::for_operation(operation, &config);
            assert_eq!(strategy.operation(), operation);
        }
        assert_eq!(
            Strategy::for_operation(Operation::Hash, &config).name(),
            "HASH(SHA-256)"
        );
        assert_eq!(
            Strategy::for_operation(Operation::Mask, &config).name(),
            "MASK"
        );
    }

    #[test]
    fn test_nullify_uses_configured_replacement() {
        let config = SanitizerConfig::default().with_null_replacement("N/A");
        let nullify = Strategy::for_operation(Operation::Nullify, &config);
        let hash = Strategy::for_operation(Operation::Hash, &config);
        assert_eq!(nullify.transform("123-45-6789"), "N/A");
        assert_eq!(hash.transform(""), "");
    }
}
