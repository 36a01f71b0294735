//! Column-rule sanitization stage

use super::RecordTransform;
use crate::config::SanitizerConfig;
use crate::error::Result;
use crate::models::Record;
use crate::strategy::{ColumnRules, Strategy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Applies a resolved strategy to every configured column of a record
///
/// Columns without a rule, and configured columns holding an empty value,
/// are copied through unchanged.
#[derive(Debug)]
pub struct SanitizationStage {
    strategies: HashMap<String, Strategy>,
    description: String,
    fields_sanitized: AtomicU64,
}

impl SanitizationStage {
    /// Resolve every rule to its strategy
    pub fn new(rules: &ColumnRules, config: &SanitizerConfig) -> Result<Self> {
        rules.validate()?;

        let strategies: HashMap<String, Strategy> = rules
            .iter()
            .map(|(column, operation)| {
                let strategy = Strategy::for_operation(operation, config);
                debug!("Column '{}' -> {}", column, strategy.name());
                (column.to_string(), strategy)
            })
            .collect();

        Ok(Self {
            strategies,
            description: rules.describe(),
            fields_sanitized: AtomicU64::new(0),
        })
    }

    /// Strategy configured for a column
    pub fn strategy(&self, column: &str) -> Option<&Strategy> {
        self.strategies.get(column)
    }
}

impl RecordTransform for SanitizationStage {
    fn apply(&self, record: Record) -> Result<Record> {
        let mut sanitized = Record::with_capacity(record.line_number(), record.len());
        let mut replaced = 0;

        for (column, value) in record.iter() {
            match self.strategies.get(column) {
                Some(strategy) if !value.is_empty() => {
                    sanitized.push(column, strategy.transform(value));
                    replaced += 1;
                }
                _ => sanitized.push(column, value),
            }
        }

        self.fields_sanitized.fetch_add(replaced, Ordering::Relaxed);
        Ok(sanitized)
    }

    fn rule_count(&self) -> usize {
        self.strategies.len()
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn fields_transformed(&self) -> u64 {
        self.fields_sanitized.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Operation;

    fn stage(rules: &[(&str, Operation)]) -> SanitizationStage {
        let rules = ColumnRules::new(rules.iter().map(|(c, op)| (c.to_string(), *op))).unwrap();
        SanitizationStage::new(&rules, &SanitizerConfig::default()).unwrap()
    }

    #[test]
    fn test_configured_columns_are_transformed() {
        let stage = stage(&[("email", Operation::Mask), ("ssn", Operation::Nullify)]);
        let record = Record::from_pairs(
            3,
            [("name", "John Doe"), ("email", "john@example.com"), ("ssn", "123-45-6789")],
        );

        let output = stage.apply(record).unwrap();
        let pairs: Vec<(&str, &str)> = output.iter().collect();
        assert_eq!(
            pairs,
            vec![("name", "John Doe"), ("email", "jo**@*******.com"), ("ssn", "")]
        );
        assert_eq!(output.line_number(), 3);
        assert_eq!(stage.fields_transformed(), 2);
    }

    #[test]
    fn test_empty_values_are_left_alone() {
        let config = SanitizerConfig::default().with_null_replacement("REDACTED");
        let rules = ColumnRules::new([("ssn", Operation::Nullify)]).unwrap();
        let stage = SanitizationStage::new(&rules, &config).unwrap();

        let output = stage
            .apply(Record::from_pairs(1, [("ssn", ""), ("note", "x")]))
            .unwrap();
        assert_eq!(output.get("ssn"), Some(""));
        assert_eq!(stage.fields_transformed(), 0);

        let output = stage.apply(Record::from_pairs(2, [("ssn", "1")])).unwrap();
        assert_eq!(output.get("ssn"), Some("REDACTED"));
    }

    #[test]
    fn test_rules_for_absent_columns_are_ignored() {
        let stage = stage(&[("phone", Operation::Hash)]);
        let record = Record::from_pairs(1, [("name", "Ann")]);
        assert_eq!(stage.apply(record.clone()).unwrap(), record);
    }

    #[test]
    fn test_stage_is_deterministic() {
        let stage = stage(&[("email", Operation::Randomize), ("id", Operation::Hash)]);
        let record = Record::from_pairs(1, [("email", "a@b.io"), ("id", "42")]);
        assert_eq!(
            stage.apply(record.clone()).unwrap(),
            stage.apply(record).unwrap()
        );
        assert_eq!(stage.rule_count(), 2);
        assert_eq!(stage.describe(), "email=RANDOMIZE, id=HASH");
        assert_eq!(stage.strategy("id").unwrap().name(), "HASH(SHA-256)");
    }
}
