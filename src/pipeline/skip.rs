//! Bounded skip budget shared by the read, process and write stages

use crate::error::{Result, SanitizerError};
use crate::models::{SkipCategory, SkipCounters};

/// Tolerates up to `limit` recoverable failures per run, summed across
/// categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipPolicy {
    limit: u64,
}

impl SkipPolicy {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Fails once the total exceeds the limit; `category` and `line`
    /// describe the failure that was just counted
    pub fn check(&self, counters: &SkipCounters, category: SkipCategory, line: u64) -> Result<()> {
        let total = counters.total();
        if total > self.limit {
            return Err(SanitizerError::SkipLimitExceeded {
                category,
                total,
                limit: self.limit,
                line,
            });
        }
        Ok(())
    }

    /// Failures still tolerated
    pub fn remaining(&self, counters: &SkipCounters) -> u64 {
        self.limit.saturating_sub(counters.total())
    }
}
