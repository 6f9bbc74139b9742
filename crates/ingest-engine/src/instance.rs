//! Public facade over a Neo4j deployment.

use crate::connection::{Connector, Credentials, Statement};
use crate::error::Result;
use crate::ingest::ingest;
use crate::mode::IngestOptions;
use crate::neo4j::Neo4jConnector;
use crate::session::{execute_read, execute_writes};
use ingest_types::{Dataset, Params, WriteCounters};
use std::sync::Arc;

/// Entry point for reads, writes and data-bound ingestion.
///
/// Construction performs no I/O. Every operation opens its own connection.
///
/// ```ignore
/// use ingest_engine::{ExecutionMode, IngestOptions, Neo4jInstance};
///
/// let instance = Neo4jInstance::new("bolt://localhost:7687", "neo4j", "password");
/// let stats = instance
///     .execute_write_query_with_data(
///         "UNWIND $rows AS row CREATE (:Person {name: row.name})",
///         &people,
///         &IngestOptions::default().with_partitions(4).with_mode(ExecutionMode::Threaded),
///     )
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Neo4jInstance<C: Connector = Neo4jConnector> {
    credentials: Credentials,
    connector: Arc<C>,
}

impl Neo4jInstance<Neo4jConnector> {
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::from_parts(Credentials::new(uri, user, password), Neo4jConnector::default())
    }
}

impl<C: Connector> Neo4jInstance<C> {
    pub fn from_parts(credentials: Credentials, connector: C) -> Self {
        Self {
            credentials,
            connector: Arc::new(connector),
        }
    }

    pub fn with_encryption(mut self, encrypted: bool) -> Self {
        self.credentials = self.credentials.with_encryption(encrypted);
        self
    }

    /// Swap the connection backend, keeping the credentials.
    pub fn with_connector<D: Connector>(self, connector: D) -> Neo4jInstance<D> {
        Neo4jInstance::from_parts(self.credentials, connector)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a connection and verify it with a round trip.
    pub async fn connect(&self) -> Result<C::Connection> {
        self.connector.connect(&self.credentials).await
    }

    /// Run one read statement on a fresh connection.
    ///
    /// An empty result has no columns, even when the statement projects some.
    pub async fn execute_read_query(
        &self,
        query: &str,
        database: Option<&str>,
        params: &Params,
    ) -> Result<Dataset> {
        let connection = self.connect().await?;
        let statement = Statement::new(query).with_params(params.clone());
        let dataset = execute_read(&connection, database, &statement).await?;
        tracing::debug!(
            "Read query returned {} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }

    pub async fn execute_write_query(
        &self,
        query: &str,
        database: Option<&str>,
        params: &Params,
    ) -> Result<WriteCounters> {
        self.execute_write_queries(&[query], database, params).await
    }

    /// Run each query in order on one session, one transaction each.
    pub async fn execute_write_queries<S: AsRef<str>>(
        &self,
        queries: &[S],
        database: Option<&str>,
        params: &Params,
    ) -> Result<WriteCounters> {
        let connection = self.connect().await?;
        let statements: Vec<Statement> = queries
            .iter()
            .map(|q| Statement::new(q.as_ref()).with_params(params.clone()))
            .collect();
        let totals = execute_writes(&connection, database, &statements, None).await?;
        tracing::info!("Write stats: {}", totals);
        Ok(totals)
    }

    pub async fn execute_write_query_with_data(
        &self,
        query: &str,
        dataset: &Dataset,
        options: &IngestOptions,
    ) -> Result<WriteCounters> {
        self.execute_write_queries_with_data(&[query], dataset, options)
            .await
    }

    /// Partition `dataset` and apply every query to each batch.
    pub async fn execute_write_queries_with_data<S: AsRef<str>>(
        &self,
        queries: &[S],
        dataset: &Dataset,
        options: &IngestOptions,
    ) -> Result<WriteCounters> {
        ingest(&self.connector, &self.credentials, queries, dataset, options).await
    }
}

