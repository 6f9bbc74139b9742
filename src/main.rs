//! Command-line interface for neo4j-ingest
//!
//! # Usage Examples
//!
//! ## Ingest plans
//! ```bash
//! # Run pre-ingest statements and load every data file of a plan
//! neo4j-ingest --uri bolt://localhost:7687 --password secret load plan.yaml
//! ```
//!
//! ## Ad-hoc statements
//! ```bash
//! # Read query, printed as JSON columns and rows
//! neo4j-ingest query 'MATCH (p:Person) WHERE p.born > $year RETURN p.name AS name' \
//!   --param year=1960
//!
//! # Schema statements, counters printed as JSON
//! neo4j-ingest write 'CREATE INDEX person_born IF NOT EXISTS FOR (p:Person) ON (p.born)'
//!
//! # CSV load in parallel with 4 workers
//! neo4j-ingest write 'UNWIND $rows AS row MERGE (p:Person {name: row.name})' \
//!   --data people.csv --partitions 8 --mode parallel --workers 4
//! ```
//!
//! Connection settings also come from `NEO4J_URI`, `NEO4J_USER`,
//! `NEO4J_PASSWORD` and `NEO4J_DATABASE`. Log verbosity follows `RUST_LOG`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ingest_engine::ExecutionMode;
use ingest_types::Value;
use neo4j_ingest::{
    dataset_to_json, load_datafile, params_from, parse_param, run_plan, Cypher, DataFile,
    IngestPlan, Neo4jOpts,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "neo4j-ingest")]
#[command(about = "A tool for bulk-loading tabular data into Neo4j")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    neo4j: Neo4jOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an ingest plan file
    Load {
        /// Path to the YAML ingest plan
        plan: PathBuf,
    },

    /// Run a read query and print the rows as JSON
    Query {
        /// Cypher read statement
        query: String,

        /// Statement parameter (format: name=value)
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },

    /// Run write statements, optionally once per batch of a CSV file
    Write {
        /// Cypher write statements, applied in order
        #[arg(required = true)]
        queries: Vec<String>,

        /// Statement parameter (format: name=value)
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// CSV file bound as $rows, batch by batch
        #[arg(long)]
        data: Option<PathBuf>,

        /// Batches per chunk
        #[arg(long, default_value = "1")]
        partitions: usize,

        /// Execution mode (sequential, threaded, parallel)
        #[arg(long, default_value = "sequential")]
        mode: ExecutionMode,

        /// Parallel worker count (defaults to the CPU count)
        #[arg(long)]
        workers: Option<usize>,

        /// Records read per chunk
        #[arg(long, default_value = "1000")]
        chunk_size: usize,

        /// CSV field separator
        #[arg(long, default_value = ",")]
        field_separator: char,

        /// Data records skipped after the header
        #[arg(long, default_value = "0")]
        skip_records: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let instance = cli.neo4j.instance();
    let database = cli.neo4j.database.clone();

    match cli.command {
        Commands::Load { plan } => {
            let mut plan = IngestPlan::from_file(&plan)?;
            if database.is_some() {
                plan.database = database;
            }
            let report = run_plan(&instance, &plan).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Query { query, params } => {
            let dataset = instance
                .execute_read_query(&query, database.as_deref(), &params_from(params))
                .await
                .context("Read query failed")?;
            println!("{}", dataset_to_json(&dataset)?);
        }
        Commands::Write {
            queries,
            params,
            data,
            partitions,
            mode,
            workers,
            chunk_size,
            field_separator,
            skip_records,
        } => match data {
            Some(path) => {
                let datafile = DataFile {
                    url: path.display().to_string(),
                    cypher: Cypher::Many(queries),
                    skip_records,
                    chunk_size,
                    field_separator,
                    skip_file: false,
                    partitions,
                    mode,
                    workers,
                    parameters: params_from(params),
                };
                let report = load_datafile(&instance, &datafile, database.as_deref())
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            None => {
                let counters = instance
                    .execute_write_queries(&queries, database.as_deref(), &params_from(params))
                    .await
                    .context("Write statements failed")?;
                println!("{}", serde_json::to_string_pretty(&counters)?);
            }
        },
    }

    Ok(())
}
