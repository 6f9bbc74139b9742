//! Result summary → [`WriteCounters`].

use ingest_types::{WriteCounters, CONTAINS_UPDATES};
use neo4rs::summary::{Counters, ResultSummary};

/// Counters reported by a completed write transaction.
pub fn counters_from_summary(summary: &ResultSummary) -> WriteCounters {
    counters_from_stats(summary.stats())
}

/// Only non-zero counters are kept. [`CONTAINS_UPDATES`] is set when any
/// counter is non-zero.
pub fn counters_from_stats(stats: &Counters) -> WriteCounters {
    let mut counters: WriteCounters = [
        ("nodes_created", stats.nodes_created as u64),
        ("nodes_deleted", stats.nodes_deleted as u64),
        ("relationships_created", stats.relationships_created as u64),
        ("relationships_deleted", stats.relationships_deleted as u64),
        ("properties_set", stats.properties_set as u64),
        ("labels_added", stats.labels_added as u64),
        ("labels_removed", stats.labels_removed as u64),
        ("indexes_added", stats.indexes_added as u64),
        ("indexes_removed", stats.indexes_removed as u64),
        ("constraints_added", stats.constraints_added as u64),
        ("constraints_removed", stats.constraints_removed as u64),
        ("system_updates", stats.system_updates as u64),
    ]
    .into_iter()
    .filter(|(_, value)| *value > 0)
    .collect();

    if !counters.is_empty() {
        counters.insert(CONTAINS_UPDATES, 1);
    }
    counters
}
