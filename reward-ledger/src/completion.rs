//! Per-scope completion records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Unit IDs an account has already been paid for within one course or book.
///
/// Grows monotonically; there is no removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct CompletionRecord {
    claimed: BTreeSet<String>,
}

impl CompletionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.claimed.contains(unit_id)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.claimed.iter().map(String::as_str)
    }

    /// Returns `false` if the unit was already present.
    pub(crate) fn insert(&mut self, unit_id: &str) -> bool {
        self.claimed.insert(unit_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut record = CompletionRecord::new();
        assert!(record.insert("l1"));
        assert!(!record.insert("l1"));
        assert_eq!(record.len(), 1);
        assert!(record.contains("l1"));
        assert!(!record.contains("l2"));
    }
}
