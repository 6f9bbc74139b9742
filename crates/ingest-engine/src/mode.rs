//! Execution strategy selection and ingestion options.

use ingest_types::Params;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How batches are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One session, batches in order.
    #[default]
    Sequential,
    /// One task per batch sharing a single connection.
    Threaded,
    /// A bounded pool of isolated workers, each with its own connection.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Threaded => write!(f, "threaded"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "threaded" => Ok(ExecutionMode::Threaded),
            "parallel" => Ok(ExecutionMode::Parallel),
            other => Err(format!(
                "unknown execution mode '{other}' (expected sequential, threaded or parallel)"
            )),
        }
    }
}

/// Options for a data-bound write.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Target database; `None` uses the server default.
    pub database: Option<String>,
    pub partitions: usize,
    pub mode: ExecutionMode,
    /// Parallel pool size; see [`resolve_workers`].
    pub workers: Option<usize>,
    /// Scalar parameters bound alongside `$rows`.
    pub parameters: Params,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            database: None,
            partitions: 1,
            mode: ExecutionMode::default(),
            workers: None,
            parameters: Params::new(),
        }
    }
}

impl IngestOptions {
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Parallel pool size: the configured count when it lies in
/// `1..=available`, otherwise every available execution unit.
pub fn resolve_workers(configured: Option<usize>) -> usize {
    resolve_workers_for(configured, num_cpus::get())
}

fn resolve_workers_for(configured: Option<usize>, available: usize) -> usize {
    let available = available.max(1);
    match configured {
        Some(workers) if (1..=available).contains(&workers) => workers,
        _ => available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_workers() {
        assert_eq!(resolve_workers_for(Some(2), 8), 2);
        assert_eq!(resolve_workers_for(Some(8), 8), 8);
        assert_eq!(resolve_workers_for(Some(0), 8), 8);
        assert_eq!(resolve_workers_for(Some(64), 8), 8);
        assert_eq!(resolve_workers_for(None, 8), 8);
        assert_eq!(resolve_workers_for(None, 0), 1);
    }

    #[test]
    fn test_resolve_workers_uses_cpu_count() {
        assert_eq!(resolve_workers(None), num_cpus::get().max(1));
        assert_eq!(resolve_workers(Some(1)), 1);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "Threaded".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Threaded
        );
        assert!("process".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::Parallel.to_string(), "parallel");

        let mode: ExecutionMode = serde_yaml::from_str("parallel").unwrap();
        assert_eq!(mode, ExecutionMode::Parallel);
    }

    #[test]
    fn test_default_options() {
        let options = IngestOptions::default();
        assert_eq!(options.partitions, 1);
        assert_eq!(options.mode, ExecutionMode::Sequential);
        assert!(options.database.is_none());
    }
}
