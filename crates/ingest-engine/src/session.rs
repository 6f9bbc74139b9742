//! One-shot units of work: acquire a session, run, release.

use crate::connection::{Connection, Session, Statement};
use crate::error::Result;
use ingest_types::{Dataset, RowBatch, WriteCounters};

/// Run a read statement and materialize the result.
///
/// Column names come from the returned rows, so a result without rows is a
/// dataset with no columns at all.
pub async fn execute_read<K: Connection>(
    connection: &K,
    database: Option<&str>,
    statement: &Statement,
) -> Result<Dataset> {
    let mut session = connection.open_session(database).await?;
    session.run_read(statement).await
}

/// Run a single write statement in one transaction.
pub async fn execute_write<K: Connection>(
    connection: &K,
    database: Option<&str>,
    statement: &Statement,
    rows: Option<&RowBatch>,
) -> Result<WriteCounters> {
    let mut session = connection.open_session(database).await?;
    session.run_write(statement, rows).await
}

/// Run write statements in order on one session, one transaction each,
/// and return their summed counters. Stops at the first failure.
pub async fn execute_writes<K: Connection>(
    connection: &K,
    database: Option<&str>,
    statements: &[Statement],
    rows: Option<&RowBatch>,
) -> Result<WriteCounters> {
    let mut session = connection.open_session(database).await?;
    let mut totals = WriteCounters::new();
    for statement in statements {
        let delta = session.run_write(statement, rows).await?;
        totals.merge(&delta);
    }
    Ok(totals)
}
