//! Neo4j/Bolt type conversions for ingest-types values.
//!
//! # Modules
//!
//! - [`forward`] - `Value` / `RowBatch` / `Params` → Bolt parameters
//! - [`reverse`] - Bolt values and rows → `Value` / `Dataset`
//! - [`summary`] - result summaries → `WriteCounters`
//! - [`error`] - Error types for conversion failures
//!
//! All conversions return `Result`; nothing silently falls back to a default.
//!
//! # Example
//!
//! ```ignore
//! use ingest_types::Value;
//! use neo4j_types::{bolt_to_value, value_to_bolt};
//!
//! let bolt = value_to_bolt(&Value::from("hello"))?;
//! assert_eq!(bolt_to_value(bolt)?, Value::from("hello"));
//! ```

pub mod error;
pub mod forward;
pub mod reverse;
pub mod summary;

pub use error::{Neo4jTypesError, Result};
pub use forward::{bind_params, rows_to_bolt, value_to_bolt, ROWS_PARAM};
pub use reverse::{bolt_to_value, row_to_values};
pub use summary::{counters_from_stats, counters_from_summary};
