//! Core data types shared by the neo4j-ingest crates.
//!
//! This crate has no database dependencies. It defines:
//!
//! - [`Value`] - a dynamically typed cell or parameter value
//! - [`Dataset`] - ordered columns plus rows, used both as ingestion input and
//!   as the materialized result of a read query
//! - [`RowBatch`] / [`Record`] - one partition of a dataset, ready to be bound
//!   as the `rows` parameter of a write statement
//! - [`WriteCounters`] - per-transaction write statistics and their running sum
//!
//! # Example
//!
//! ```
//! use ingest_types::{Dataset, Value, WriteCounters};
//!
//! let dataset = Dataset::new(
//!     vec!["name".to_string(), "born".to_string()],
//!     vec![vec![Value::from("Keanu Reeves"), Value::from(1964)]],
//! )
//! .unwrap();
//! assert_eq!(dataset.row_count(), 1);
//!
//! let mut total = WriteCounters::new();
//! total.merge(&WriteCounters::from_iter([("nodes_created", 1), ("properties_set", 2)]));
//! assert_eq!(total.get("nodes_created"), 1);
//! ```

pub mod counters;
pub mod dataset;
pub mod error;
pub mod value;

pub use counters::{WriteCounters, CONTAINS_UPDATES};
pub use dataset::{Dataset, Record, RowBatch};
pub use error::DatasetError;
pub use value::{Params, Value};
