//! Runs an ingest plan: `pre_ingest` statements first, then every data file
//! chunk by chunk through the ingestion engine.

use crate::plan::{DataFile, IngestPlan};
use crate::source::CsvSource;
use anyhow::{Context, Result};
use ingest_engine::{Connector, Neo4jInstance};
use ingest_types::{Params, WriteCounters};
use serde::Serialize;

/// Outcome of one data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileReport {
    pub url: String,
    pub skipped: bool,
    pub chunks: usize,
    pub rows: usize,
    pub counters: WriteCounters,
}

/// Outcome of a whole plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanReport {
    pub pre_ingest: WriteCounters,
    pub files: Vec<FileReport>,
}

impl PlanReport {
    /// Counters summed over `pre_ingest` and every file.
    pub fn totals(&self) -> WriteCounters {
        let mut totals = self.pre_ingest.clone();
        for file in &self.files {
            totals.merge(&file.counters);
        }
        totals
    }
}

/// Execute `plan` against `instance`. Stops at the first failure; chunks
/// committed before it stay committed.
pub async fn run_plan<C: Connector>(
    instance: &Neo4jInstance<C>,
    plan: &IngestPlan,
) -> Result<PlanReport> {
    let database = plan.database.as_deref();
    let mut report = PlanReport::default();

    if !plan.pre_ingest.is_empty() {
        tracing::info!("Running {} pre-ingest statements", plan.pre_ingest.len());
        report.pre_ingest = instance
            .execute_write_queries(&plan.pre_ingest, database, &Params::new())
            .await
            .context("Pre-ingest statements failed")?;
    }

    for datafile in &plan.datafiles {
        if datafile.skip_file {
            tracing::info!("Skipping {}", datafile.url);
            report.files.push(FileReport {
                url: datafile.url.clone(),
                skipped: true,
                ..Default::default()
            });
            continue;
        }
        let file_report = load_datafile(instance, datafile, database)
            .await
            .with_context(|| format!("Failed to load {}", datafile.url))?;
        report.files.push(file_report);
    }

    tracing::info!("Plan complete: {}", report.totals());
    Ok(report)
}

/// Load one data file chunk by chunk.
pub async fn load_datafile<C: Connector>(
    instance: &Neo4jInstance<C>,
    datafile: &DataFile,
    database: Option<&str>,
) -> Result<FileReport> {
    let statements = datafile.statements();
    let mut report = FileReport {
        url: datafile.url.clone(),
        ..Default::default()
    };

    for chunk in CsvSource::open(datafile)? {
        let chunk = chunk?;
        let mut options = datafile.ingest_options(database);
        // The last chunk can be shorter than the configured partition count.
        if options.partitions > chunk.row_count() {
            tracing::debug!(
                "Reducing partitions from {} to {} for a chunk of {} rows",
                options.partitions,
                chunk.row_count(),
                chunk.row_count()
            );
            options.partitions = chunk.row_count();
        }

        let counters = instance
            .execute_write_queries_with_data(&statements, &chunk, &options)
            .await?;
        report.chunks += 1;
        report.rows += chunk.row_count();
        report.counters.merge(&counters);
        tracing::debug!("Chunk {} of {} loaded: {}", report.chunks, datafile.url, counters);
    }

    tracing::info!(
        "Loaded {} rows from {}: {}",
        report.rows,
        datafile.url,
        report.counters
    );
    Ok(report)
}
