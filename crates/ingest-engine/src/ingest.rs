//! Ingestion orchestrator: partitions a dataset and applies write
//! statements to every batch under one [`ExecutionMode`].

use crate::connection::{Connection, Connector, Credentials, Session, Statement};
use crate::error::{IngestError, Result};
use crate::mode::{resolve_workers, ExecutionMode, IngestOptions};
use crate::partition::partition;
use crate::session::execute_writes;
use futures::stream::{self, StreamExt};
use ingest_types::{Dataset, RowBatch, WriteCounters};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinError;

/// Apply `queries` to every batch of `dataset` and return the summed counters.
///
/// The partition count is validated before any connection is opened. In
/// threaded and parallel mode every worker is awaited before returning, and
/// the first failure in batch order is reported.
pub async fn ingest<C: Connector, S: AsRef<str>>(
    connector: &Arc<C>,
    credentials: &Credentials,
    queries: &[S],
    dataset: &Dataset,
    options: &IngestOptions,
) -> Result<WriteCounters> {
    let batches = partition(dataset, options.partitions)?;
    if queries.is_empty() {
        return Ok(WriteCounters::new());
    }

    let statements: Arc<Vec<Statement>> = Arc::new(
        queries
            .iter()
            .map(|q| Statement::new(q.as_ref()).with_params(options.parameters.clone()))
            .collect(),
    );
    let database = options.database.clone();

    let totals = match options.mode {
        ExecutionMode::Sequential => {
            tracing::info!(
                "Loading {} rows in {} batches sequentially",
                dataset.row_count(),
                batches.len()
            );
            run_sequential(connector.as_ref(), credentials, database, &statements, batches).await?
        }
        ExecutionMode::Threaded => {
            tracing::info!(
                "Loading {} rows in {} batches on {} concurrent tasks",
                dataset.row_count(),
                batches.len(),
                batches.len()
            );
            run_threaded(connector.as_ref(), credentials, database, statements, batches).await?
        }
        ExecutionMode::Parallel => {
            let workers = resolve_workers(options.workers);
            tracing::info!(
                "Loading {} rows in {} batches with {} parallel workers",
                dataset.row_count(),
                batches.len(),
                workers
            );
            run_parallel(connector, credentials, database, statements, batches, workers).await?
        }
    };

    tracing::info!("Loading stats: {}", totals);
    Ok(totals)
}

async fn run_sequential<C: Connector>(
    connector: &C,
    credentials: &Credentials,
    database: Option<String>,
    statements: &[Statement],
    batches: Vec<RowBatch>,
) -> Result<WriteCounters> {
    let connection = connector.connect(credentials).await?;
    let mut session = connection.open_session(database.as_deref()).await?;
    let mut totals = WriteCounters::new();
    let count = batches.len();

    for (index, batch) in batches.iter().enumerate() {
        for statement in statements {
            let delta = session.run_write(statement, Some(batch)).await?;
            totals.merge(&delta);
        }
        tracing::debug!("Batch {}/{} committed ({} rows)", index + 1, count, batch.len());
    }
    Ok(totals)
}

async fn run_threaded<C: Connector>(
    connector: &C,
    credentials: &Credentials,
    database: Option<String>,
    statements: Arc<Vec<Statement>>,
    batches: Vec<RowBatch>,
) -> Result<WriteCounters> {
    let connection = connector.connect(credentials).await?;
    let totals = Arc::new(Mutex::new(WriteCounters::new()));
    let count = batches.len();

    let mut handles = Vec::with_capacity(count);
    for (index, batch) in batches.into_iter().enumerate() {
        let connection = connection.clone();
        let database = database.clone();
        let statements = Arc::clone(&statements);
        let totals = Arc::clone(&totals);

        handles.push(tokio::spawn(async move {
            let mut session = connection.open_session(database.as_deref()).await?;
            for statement in statements.iter() {
                let delta = session.run_write(statement, Some(&batch)).await?;
                totals.lock().await.merge(&delta);
            }
            tracing::debug!("Batch {}/{} committed ({} rows)", index + 1, count, batch.len());
            Ok::<(), IngestError>(())
        }));
    }

    let outcomes = futures::future::join_all(handles).await;
    first_failure(outcomes)?;

    let totals = totals.lock().await.clone();
    Ok(totals)
}

async fn run_parallel<C: Connector>(
    connector: &Arc<C>,
    credentials: &Credentials,
    database: Option<String>,
    statements: Arc<Vec<Statement>>,
    batches: Vec<RowBatch>,
    workers: usize,
) -> Result<WriteCounters> {
    let count = batches.len();

    // Jobs are spawned lazily as the stream pulls them, so at most
    // `workers` are in flight.
    let jobs = batches.into_iter().enumerate().map(|(index, batch)| {
        let connector = Arc::clone(connector);
        let credentials = credentials.clone();
        let database = database.clone();
        let statements = Arc::clone(&statements);

        let handle = tokio::spawn(async move {
            let connection = connector.connect(&credentials).await?;
            let counters =
                execute_writes(&connection, database.as_deref(), &statements, Some(&batch))
                    .await?;
            tracing::debug!("Batch {}/{} committed ({} rows)", index + 1, count, batch.len());
            Ok::<WriteCounters, IngestError>(counters)
        });
        async move { (index, handle.await) }
    });

    let mut outcomes: Vec<(usize, std::result::Result<Result<WriteCounters>, JoinError>)> =
        stream::iter(jobs).buffer_unordered(workers).collect().await;
    outcomes.sort_by_key(|(index, _)| *index);

    let results = first_failure(outcomes.into_iter().map(|(_, outcome)| outcome))?;
    let mut totals = WriteCounters::new();
    for delta in &results {
        totals.merge(delta);
    }
    Ok(totals)
}

/// Collect worker results in order, or return the first failure.
fn first_failure<T>(
    outcomes: impl IntoIterator<Item = std::result::Result<Result<T>, JoinError>>,
) -> Result<Vec<T>> {
    let mut results = Vec::new();
    let mut failure = None;
    for outcome in outcomes {
        match outcome {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(err)) => {
                failure.get_or_insert(err);
            }
            Err(join_err) => {
                failure.get_or_insert(IngestError::from(join_err));
            }
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_in_order() {
        let outcomes: Vec<std::result::Result<Result<u32>, JoinError>> = vec![
            Ok(Ok(1)),
            Ok(Err(IngestError::QueryExecution("batch 2".to_string()))),
            Ok(Err(IngestError::QueryExecution("batch 3".to_string()))),
        ];
        match first_failure(outcomes) {
            Err(IngestError::QueryExecution(message)) => assert_eq!(message, "batch 2"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_first_failure_all_ok() {
        let outcomes: Vec<std::result::Result<Result<u32>, JoinError>> =
            vec![Ok(Ok(1)), Ok(Ok(2))];
        assert_eq!(first_failure(outcomes).unwrap(), vec![1, 2]);
    }
}
