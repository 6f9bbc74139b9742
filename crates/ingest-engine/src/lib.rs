//! Partitioned write ingestion into Neo4j.
//!
//! The engine splits a [`Dataset`](ingest_types::Dataset) into row batches and
//! applies one or more Cypher write statements to every batch, each batch in
//! its own transaction, under one of three strategies:
//!
//! - [`ExecutionMode::Sequential`] - one session, batches in order
//! - [`ExecutionMode::Threaded`] - one task per batch on a shared connection
//! - [`ExecutionMode::Parallel`] - a bounded pool of workers, each with its
//!   own connection; results are merged after every worker finishes
//!
//! All strategies return the same summed [`WriteCounters`](ingest_types::WriteCounters).
//!
//! # Modules
//!
//! - [`connection`] - credentials, endpoint resolution and backend traits
//! - [`neo4j`] - the Bolt driver backend
//! - [`session`] - one-shot read and write units of work
//! - [`partition`] - batch partitioning
//! - [`mode`] - execution modes, options and worker resolution
//! - [`ingest`] - the orchestrator
//! - [`instance`] - the [`Neo4jInstance`] facade
//! - [`testing`] - in-memory backend for tests

pub mod connection;
pub mod error;
pub mod ingest;
pub mod instance;
pub mod mode;
pub mod neo4j;
pub mod partition;
pub mod session;
pub mod testing;

pub use connection::{resolve_endpoint, Connection, Connector, Credentials, Session, Statement};
pub use error::{IngestError, Result};
pub use ingest::ingest;
pub use instance::Neo4jInstance;
pub use mode::{resolve_workers, ExecutionMode, IngestOptions};
pub use neo4j::{Neo4jConnection, Neo4jConnector, Neo4jSession};
pub use partition::partition;
pub use session::{execute_read, execute_write, execute_writes};
