//! Constant replacement of field values

/// Replaces every value with a fixed string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullifyStrategy {
    replacement: String,
}

impl NullifyStrategy {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn apply(&self, _value: &str) -> String {
        self.replacement.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_replacement_is_empty() {
        let strategy = NullifyStrategy::default();
        assert_eq!(strategy.apply("123-45-6789"), "");
        assert_eq!(strategy.apply(""), "");
    }

    #[test]
    fn test_configured_replacement() {
        let strategy = NullifyStrategy::new("[REDACTED]");
        assert_eq!(strategy.apply("john@example.com"), "[REDACTED]");
        assert_eq!(strategy.apply("42"), "[REDACTED]");
        assert_eq!(strategy.apply("a,b,\"c\"\nd"), "[REDACTED]");
    }

    proptest! {
        #[test]
        fn prop_nullify_is_constant(value in ".*") {
            prop_assert_eq!(NullifyStrategy::new("NULL").apply(&value), "NULL");
        }
    }
}
