//! Bolt driver implementation of the connection traits.

use crate::connection::{Connection, Connector, Credentials, Session, Statement};
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use ingest_types::{Dataset, RowBatch, WriteCounters};
use neo4j_types::{bind_params, counters_from_summary, row_to_values, rows_to_bolt, ROWS_PARAM};
use neo4rs::{query, ConfigBuilder, Graph, Query, Row, Txn};

pub const DEFAULT_MAX_CONNECTIONS: usize = 16;
pub const DEFAULT_FETCH_SIZE: usize = 200;

/// Opens pooled Bolt connections.
#[derive(Debug, Clone, Copy)]
pub struct Neo4jConnector {
    max_connections: usize,
    fetch_size: usize,
}

impl Default for Neo4jConnector {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }
}

impl Neo4jConnector {
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size.max(1);
        self
    }
}

#[async_trait]
impl Connector for Neo4jConnector {
    type Connection = Neo4jConnection;

    async fn connect(&self, credentials: &Credentials) -> Result<Neo4jConnection> {
        let endpoint = credentials.endpoint()?;
        tracing::debug!("Connecting to Neo4j at: {}", endpoint);

        let config = ConfigBuilder::default()
            .uri(&endpoint)
            .user(credentials.user())
            .password(credentials.password())
            .max_connections(self.max_connections)
            .fetch_size(self.fetch_size)
            .build()?;
        let graph = Graph::connect(config)?;

        // The pool is lazy; a round trip surfaces unreachable hosts and bad credentials now.
        graph.run(query("RETURN 1")).await?;
        tracing::debug!("Neo4j connection established");
        Ok(Neo4jConnection { graph })
    }
}

/// A connected driver pool. Clones share the pool.
#[derive(Clone)]
pub struct Neo4jConnection {
    graph: Graph,
}

impl Neo4jConnection {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

#[async_trait]
impl Connection for Neo4jConnection {
    type Session = Neo4jSession;

    async fn open_session(&self, database: Option<&str>) -> Result<Neo4jSession> {
        Ok(Neo4jSession {
            graph: self.graph.clone(),
            database: database.map(str::to_string),
        })
    }
}

/// Session bound to one target database.
pub struct Neo4jSession {
    graph: Graph,
    database: Option<String>,
}

#[async_trait]
impl Session for Neo4jSession {
    async fn run_write(
        &mut self,
        statement: &Statement,
        rows: Option<&RowBatch>,
    ) -> Result<WriteCounters> {
        let query = build_query(statement, rows)?;
        let mut txn = match &self.database {
            Some(database) => self.graph.start_txn_on(database.as_str()).await?,
            None => self.graph.start_txn().await?,
        };

        match txn.run(query).await {
            Ok(summary) => {
                txn.commit().await?;
                Ok(counters_from_summary(&summary))
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!("Rollback after failed statement also failed: {}", rollback_err);
                }
                Err(err.into())
            }
        }
    }

    /// Reads the default database through a read unit of work. A named
    /// database is read inside an explicit transaction on that database.
    async fn run_read(&mut self, statement: &Statement) -> Result<Dataset> {
        let query = build_query(statement, None)?;
        let mut rows = ReadRows::default();

        match &self.database {
            Some(database) => {
                let mut txn = self.graph.start_txn_on(database.as_str()).await?;
                match read_in_txn(&mut txn, query, &mut rows).await {
                    Ok(()) => {
                        txn.commit().await?;
                    }
                    Err(err) => {
                        if let Err(rollback_err) = txn.rollback().await {
                            tracing::warn!(
                                "Rollback after failed read also failed: {}",
                                rollback_err
                            );
                        }
                        return Err(err);
                    }
                }
            }
            None => {
                let mut stream = self.graph.execute_read(query).await?;
                while let Some(row) = stream.next().await? {
                    rows.push(&row)?;
                }
            }
        }
        Ok(rows.finish())
    }
}

async fn read_in_txn(txn: &mut Txn, query: Query, rows: &mut ReadRows) -> Result<()> {
    let mut stream = txn.execute(query).await?;
    while let Some(row) = stream.next(txn.handle()).await? {
        rows.push(&row)?;
    }
    Ok(())
}

/// Accumulates result rows; the first row fixes the columns.
#[derive(Default)]
struct ReadRows {
    dataset: Option<Dataset>,
}

impl ReadRows {
    fn push(&mut self, row: &Row) -> Result<()> {
        let (columns, values) = row_to_values(row)?;
        if self.dataset.is_none() {
            self.dataset = Some(
                Dataset::with_columns(columns)
                    .map_err(|e| IngestError::QueryExecution(e.to_string()))?,
            );
        }
        if let Some(dataset) = self.dataset.as_mut() {
            dataset
                .push_row(values)
                .map_err(|e| IngestError::QueryExecution(e.to_string()))?;
        }
        Ok(())
    }

    /// A result with no rows carries no column names.
    fn finish(self) -> Dataset {
        self.dataset.unwrap_or_default()
    }
}

/// Bind user parameters, then the batch as `$rows`. The batch wins a name clash.
fn build_query(statement: &Statement, rows: Option<&RowBatch>) -> Result<Query> {
    let mut bound = bind_params(query(statement.text()), statement.params())?;
    if let Some(rows) = rows {
        if statement.params().contains_key(ROWS_PARAM) {
            tracing::warn!(
                "Parameter '{}' is reserved for the row batch and was overridden",
                ROWS_PARAM
            );
        }
        bound = bound.param(ROWS_PARAM, rows_to_bolt(rows)?);
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::{Params, Record, Value};
    use neo4rs::{BoltInteger, BoltList, BoltString, BoltType};

    #[test]
    fn test_build_query_binds_rows_and_params() {
        let mut params = Params::new();
        params.insert("label".to_string(), Value::from("Movie"));
        let statement = Statement::new("UNWIND $rows AS row RETURN row").with_params(params);

        let mut record = Record::new();
        record.insert("title".to_string(), Value::from("The Matrix"));
        let batch = RowBatch::new(vec![record]);

        let query = build_query(&statement, Some(&batch)).unwrap();
        assert!(query.has_param_key("label"));
        assert!(query.has_param_key(ROWS_PARAM));
    }

    #[test]
    fn test_build_query_without_rows() {
        let query = build_query(&Statement::new("RETURN 1"), None).unwrap();
        assert!(!query.has_param_key(ROWS_PARAM));
    }

    #[test]
    fn test_read_rows_keep_first_row_columns() {
        let fields = || {
            BoltList::from(vec![
                BoltType::String(BoltString::new("title")),
                BoltType::String(BoltString::new("released")),
            ])
        };
        let mut rows = ReadRows::default();
        for (title, released) in [("The Matrix", 1999), ("Speed", 1994)] {
            let data = BoltList::from(vec![
                BoltType::String(BoltString::new(title)),
                BoltType::Integer(BoltInteger::new(released)),
            ]);
            rows.push(&Row::new(fields(), data)).unwrap();
        }

        let dataset = rows.finish();
        assert_eq!(dataset.columns(), &["released".to_string(), "title".to_string()]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.rows()[1], vec![Value::Int(1994), Value::from("Speed")]);
    }

    #[test]
    fn test_read_rows_empty_result_has_no_columns() {
        let dataset = ReadRows::default().finish();
        assert_eq!(dataset.column_count(), 0);
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_connector_limits_clamped() {
        let connector = Neo4jConnector::default()
            .with_max_connections(0)
            .with_fetch_size(0);
        assert_eq!(connector.max_connections, 1);
        assert_eq!(connector.fetch_size, 1);
    }
}
