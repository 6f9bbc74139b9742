//! Error taxonomy for connections, sessions and ingestion runs.

use neo4j_types::Neo4jTypesError;
use neo4rs::{Neo4jClientErrorKind, Neo4jErrorKind, Neo4jSecurityErrorKind};
use thiserror::Error;

/// Errors surfaced by the ingestion engine.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The database cannot be reached at the configured address.
    #[error("Neo4j service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The credentials were rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Malformed address, unsupported scheme, or conflicting encryption settings.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A statement failed; the enclosing transaction was rolled back.
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// The requested partition count is not between 1 and the row count.
    #[error(
        "Invalid partition count {partitions}: must be between 1 and the number of rows ({rows})"
    )]
    InvalidPartitionCount { partitions: usize, rows: usize },

    /// A value could not be converted to or from its Bolt form.
    #[error("Value conversion failed: {0}")]
    Conversion(#[from] Neo4jTypesError),

    /// A concurrent worker panicked or was cancelled.
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<neo4rs::Error> for IngestError {
    fn from(err: neo4rs::Error) -> Self {
        match &err {
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                IngestError::ServiceUnavailable(err.to_string())
            }
            neo4rs::Error::AuthenticationError(message) => {
                IngestError::AuthenticationFailed(message.clone())
            }
            neo4rs::Error::UrlParseError(_)
            | neo4rs::Error::UnsupportedScheme(_)
            | neo4rs::Error::InvalidConfig => IngestError::InvalidEndpoint(err.to_string()),
            neo4rs::Error::Neo4j(server) => classify_server_error(server.kind(), err.to_string()),
            other => IngestError::QueryExecution(other.to_string()),
        }
    }
}

/// Only `Neo.ClientError.Security.Unauthorized` means bad credentials. The
/// other security codes (`Forbidden`, expired tokens) reject a statement.
fn classify_server_error(kind: Neo4jErrorKind, message: String) -> IngestError {
    match kind {
        Neo4jErrorKind::Client(Neo4jClientErrorKind::Security(
            Neo4jSecurityErrorKind::Authentication,
        )) => IngestError::AuthenticationFailed(message),
        _ => IngestError::QueryExecution(message),
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        IngestError::Worker(err.to_string())
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
