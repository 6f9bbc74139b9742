//! Write outcome counters and their aggregation.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// Flag reported alongside the counters of a transaction. It describes the
/// transaction rather than counting anything, so [`WriteCounters::merge`]
/// never carries it into a running total.
pub const CONTAINS_UPDATES: &str = "contains_updates";

/// Counter name to count, e.g. `nodes_created` or `properties_set`.
///
/// A single transaction reports only its non-zero counters. The same type
/// holds the running sum across all transactions of one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteCounters(BTreeMap<String, u64>);

impl WriteCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `key`; absent keys read as zero.
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.0.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether the transaction reported that it changed anything.
    pub fn contains_updates(&self) -> bool {
        self.get(CONTAINS_UPDATES) > 0
    }

    /// Add every counter of `delta` except [`CONTAINS_UPDATES`] into `self`.
    ///
    /// Keys missing from `self` start at zero. Zero deltas are skipped, so
    /// merging an all-zero map leaves `self` unchanged.
    pub fn merge(&mut self, delta: &WriteCounters) {
        for (key, value) in delta.iter() {
            if key == CONTAINS_UPDATES || value == 0 {
                continue;
            }
            *self.0.entry(key.to_string()).or_insert(0) += value;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn into_inner(self) -> BTreeMap<String, u64> {
        self.0
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for WriteCounters {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for WriteCounters {
    type Item = (String, u64);
    type IntoIter = btree_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for WriteCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_accumulates() {
        let mut total = WriteCounters::new();
        total.merge(&WriteCounters::from_iter([
            ("nodes_created", 3),
            ("properties_set", 6),
        ]));
        total.merge(&WriteCounters::from_iter([
            ("nodes_created", 2),
            ("labels_added", 2),
        ]));

        assert_eq!(total.get("nodes_created"), 5);
        assert_eq!(total.get("properties_set"), 6);
        assert_eq!(total.get("labels_added"), 2);
        assert_eq!(total.get("relationships_created"), 0);
    }

    #[test]
    fn test_merge_skips_contains_updates() {
        let mut total = WriteCounters::new();
        let delta = WriteCounters::from_iter([(CONTAINS_UPDATES, 1), ("constraints_added", 1)]);
        assert!(delta.contains_updates());

        total.merge(&delta);
        total.merge(&delta);

        assert!(!total.contains_key(CONTAINS_UPDATES));
        assert_eq!(
            total,
            WriteCounters::from_iter([("constraints_added", 2)])
        );
    }

    #[test]
    fn test_merge_zero_is_identity() {
        let mut total = WriteCounters::from_iter([("nodes_created", 4)]);
        let before = total.clone();

        total.merge(&WriteCounters::new());
        total.merge(&WriteCounters::from_iter([
            ("nodes_created", 0),
            ("properties_set", 0),
        ]));

        assert_eq!(total, before);
    }

    #[test]
    fn test_serialize_as_map() {
        let counters = WriteCounters::from_iter([("nodes_created", 2), ("labels_added", 2)]);
        let json = serde_json::to_string(&counters).unwrap();
        assert_eq!(json, r#"{"labels_added":2,"nodes_created":2}"#);
        assert_eq!(counters.to_string(), "{labels_added: 2, nodes_created: 2}");
    }
}
