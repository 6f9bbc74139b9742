//! Test infrastructure: an in-memory connector that records every
//! connection, session and transaction, plus live-server configuration.

use crate::connection::{Connection, Connector, Credentials, Session, Statement};
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use ingest_types::{Dataset, RowBatch, WriteCounters, CONTAINS_UPDATES};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type WriteHandler = dyn Fn(&Statement, Option<&RowBatch>) -> Result<WriteCounters> + Send + Sync;
pub type ReadHandler = dyn Fn(&Statement) -> Result<Dataset> + Send + Sync;

/// One committed (or failed) write as seen by the memory backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedWrite {
    pub statement: String,
    pub database: Option<String>,
    pub rows: usize,
    pub committed: bool,
}

struct MemoryState {
    write_handler: Box<WriteHandler>,
    read_handler: Box<ReadHandler>,
    refuse: Option<fn(String) -> IngestError>,
    connections: AtomicUsize,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    active_sessions: AtomicUsize,
    peak_sessions: AtomicUsize,
    writes: Mutex<Vec<ExecutedWrite>>,
}

/// In-memory [`Connector`].
///
/// By default writes behave like `UNWIND $rows AS row CREATE (n:Label) SET n = row`
/// (see [`node_loader`]) and reads return an empty dataset.
#[derive(Clone)]
pub struct MemoryConnector {
    state: Arc<MemoryState>,
}

impl fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnector")
            .field("connections", &self.connections())
            .field("sessions_opened", &self.sessions_opened())
            .finish()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::build(Box::new(node_loader), Box::new(|_| Ok(Dataset::default())), None)
    }

    fn build(
        write_handler: Box<WriteHandler>,
        read_handler: Box<ReadHandler>,
        refuse: Option<fn(String) -> IngestError>,
    ) -> Self {
        Self {
            state: Arc::new(MemoryState {
                write_handler,
                read_handler,
                refuse,
                connections: AtomicUsize::new(0),
                sessions_opened: AtomicUsize::new(0),
                sessions_closed: AtomicUsize::new(0),
                active_sessions: AtomicUsize::new(0),
                peak_sessions: AtomicUsize::new(0),
                writes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Panics if the connector was already cloned: clones would keep the old handlers.
    fn rebuild(
        self,
        write_handler: Option<Box<WriteHandler>>,
        read_handler: Option<Box<ReadHandler>>,
        refuse: Option<fn(String) -> IngestError>,
    ) -> Self {
        match Arc::try_unwrap(self.state) {
            Ok(state) => Self::build(
                write_handler.unwrap_or(state.write_handler),
                read_handler.unwrap_or(state.read_handler),
                refuse.or(state.refuse),
            ),
            Err(_) => panic!("MemoryConnector must be configured before it is cloned"),
        }
    }

    pub fn with_write_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Statement, Option<&RowBatch>) -> Result<WriteCounters> + Send + Sync + 'static,
    {
        self.rebuild(Some(Box::new(handler)), None, None)
    }

    pub fn with_read_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Statement) -> Result<Dataset> + Send + Sync + 'static,
    {
        self.rebuild(None, Some(Box::new(handler)), None)
    }

    /// Fail every `connect` with the given error kind,
    /// e.g. `IngestError::ServiceUnavailable`.
    pub fn refusing_connections(self, kind: fn(String) -> IngestError) -> Self {
        self.rebuild(None, None, Some(kind))
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.sessions_closed.load(Ordering::SeqCst)
    }

    /// Most sessions that were open at the same time.
    pub fn peak_sessions(&self) -> usize {
        self.state.peak_sessions.load(Ordering::SeqCst)
    }

    /// Transactions attempted, committed or not.
    pub fn transactions(&self) -> usize {
        self.lock_writes().len()
    }

    pub fn writes(&self) -> Vec<ExecutedWrite> {
        self.lock_writes().clone()
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, Vec<ExecutedWrite>> {
        self.state
            .writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self, credentials: &Credentials) -> Result<MemoryConnection> {
        credentials.endpoint()?;
        if let Some(kind) = self.state.refuse {
            return Err(kind(format!("connection to {} refused", credentials.uri())));
        }
        self.state.connections.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Clone)]
pub struct MemoryConnection {
    state: Arc<MemoryState>,
}

#[async_trait]
impl Connection for MemoryConnection {
    type Session = MemorySession;

    async fn open_session(&self, database: Option<&str>) -> Result<MemorySession> {
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        let active = self.state.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_sessions.fetch_max(active, Ordering::SeqCst);
        let session = MemorySession {
            state: Arc::clone(&self.state),
            database: database.map(str::to_string),
        };
        // Let sibling tasks run so concurrent sessions overlap.
        tokio::task::yield_now().await;
        Ok(session)
    }
}

pub struct MemorySession {
    state: Arc<MemoryState>,
    database: Option<String>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.state.active_sessions.fetch_sub(1, Ordering::SeqCst);
        self.state.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn run_write(
        &mut self,
        statement: &Statement,
        rows: Option<&RowBatch>,
    ) -> Result<WriteCounters> {
        tokio::task::yield_now().await;
        let outcome = (self.state.write_handler)(statement, rows);
        self.state
            .writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ExecutedWrite {
                statement: statement.text().to_string(),
                database: self.database.clone(),
                rows: rows.map_or(0, RowBatch::len),
                committed: outcome.is_ok(),
            });
        outcome
    }

    async fn run_read(&mut self, statement: &Statement) -> Result<Dataset> {
        (self.state.read_handler)(statement)
    }
}

/// Counters a node-creating `UNWIND` statement reports for `rows`:
/// one node and label per row, one property per cell. Without rows,
/// `CREATE CONSTRAINT` / `CREATE INDEX` statements report one schema change.
pub fn node_loader(statement: &Statement, rows: Option<&RowBatch>) -> Result<WriteCounters> {
    let mut counters = WriteCounters::new();
    match rows {
        Some(batch) if !batch.is_empty() => {
            let properties: usize = batch.records().iter().map(|record| record.len()).sum();
            counters.insert("nodes_created", batch.len() as u64);
            counters.insert("labels_added", batch.len() as u64);
            if properties > 0 {
                counters.insert("properties_set", properties as u64);
            }
        }
        Some(_) => {}
        None => {
            let text = statement.text().to_ascii_uppercase();
            if text.contains("CREATE CONSTRAINT") {
                counters.insert("constraints_added", 1);
            } else if text.contains("CREATE INDEX") {
                counters.insert("indexes_added", 1);
            }
        }
    }
    if !counters.is_empty() {
        counters.insert(CONTAINS_UPDATES, 1);
    }
    Ok(counters)
}

/// Connection settings for tests against a live server.
#[derive(Debug, Clone)]
pub struct Neo4jTestConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for Neo4jTestConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Neo4jTestConfig {
    /// `NEO4J_TEST_URL` overrides the default `bolt://neo4j:7687`.
    pub fn from_env() -> Self {
        Self {
            uri: std::env::var("NEO4J_TEST_URL")
                .unwrap_or_else(|_| "bolt://neo4j:7687".to_string()),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.uri, &self.user, &self.password)
    }
}
