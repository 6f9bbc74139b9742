//! neo4j-ingest library
//!
//! Bulk-loads tabular data into Neo4j through the partitioned write engine in
//! `ingest-engine`.
//!
//! # Features
//!
//! - Ingest plans: YAML files naming `pre_ingest` statements and CSV data files
//! - Chunked CSV reading into datasets
//! - Sequential, threaded and parallel batch execution with summed write counters
//!
//! # CLI Usage
//!
//! ```bash
//! # Run an ingest plan
//! neo4j-ingest --uri bolt://localhost:7687 --user neo4j --password secret load plan.yaml
//!
//! # Run a read query with a parameter
//! neo4j-ingest query 'MATCH (m:Movie {title: $title}) RETURN m.released AS released' \
//!   --param title='The Matrix'
//!
//! # Load a CSV file with four threaded partitions
//! neo4j-ingest write 'UNWIND $rows AS row CREATE (p:Person) SET p = row' \
//!   --data people.csv --partitions 4 --mode threaded
//! ```

use clap::Parser;
use ingest_engine::{Credentials, Neo4jConnector, Neo4jInstance};
use ingest_types::{Dataset, Params, Value};

pub mod plan;
pub mod runner;
pub mod source;

pub use plan::{Cypher, DataFile, IngestPlan};
pub use runner::{load_datafile, run_plan, FileReport, PlanReport};
pub use source::CsvSource;

#[derive(Parser, Clone, Debug)]
pub struct Neo4jOpts {
    /// Neo4j connection URI (bolt, bolt+s, bolt+ssc, neo4j, neo4j+s, neo4j+ssc)
    #[arg(long, default_value = "bolt://localhost:7687", env = "NEO4J_URI")]
    pub uri: String,

    /// Neo4j username
    #[arg(long, default_value = "neo4j", env = "NEO4J_USER")]
    pub user: String,

    /// Neo4j password
    #[arg(long, default_value = "password", env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Force an encrypted connection on a bolt:// or neo4j:// URI
    #[arg(long)]
    pub encrypted: bool,

    /// Target database (defaults to the server's default database)
    #[arg(long, env = "NEO4J_DATABASE")]
    pub database: Option<String>,

    /// Maximum pooled connections per driver
    #[arg(long, default_value = "16")]
    pub max_connections: usize,

    /// Records fetched per round trip when streaming read results
    #[arg(long, default_value = "200")]
    pub fetch_size: usize,
}

impl Neo4jOpts {
    pub fn instance(&self) -> Neo4jInstance {
        let mut credentials = Credentials::new(&self.uri, &self.user, &self.password);
        if self.encrypted {
            credentials = credentials.with_encryption(true);
        }
        let connector = Neo4jConnector::default()
            .with_max_connections(self.max_connections)
            .with_fetch_size(self.fetch_size);
        Neo4jInstance::from_parts(credentials, connector)
    }
}

/// Parse a `name=value` parameter. The value is read as a YAML scalar or
/// collection, so `born=1964` binds an integer and `name=Keanu` a string.
pub fn parse_param(s: &str) -> Result<(String, Value), String> {
    let (name, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter '{s}': expected name=value"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid parameter '{s}': empty name"));
    }
    let value = if raw.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw))
    };
    Ok((name.to_string(), value))
}

/// Collect parsed `--param` values into a parameter map.
pub fn params_from(pairs: Vec<(String, Value)>) -> Params {
    pairs.into_iter().collect()
}

/// Render a read result as pretty JSON: `{"columns": [..], "rows": [[..]]}`.
/// Columns and cells keep the order of the result.
pub fn dataset_to_json(dataset: &Dataset) -> serde_json::Result<String> {
    serde_json::to_string_pretty(dataset)
}
