//! Connection seams: credentials, endpoint resolution and the
//! connector / connection / session traits.
//!
//! [`crate::neo4j`] implements these traits with the Bolt driver;
//! [`crate::testing`] implements them in memory.

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use ingest_types::{Dataset, Params, RowBatch, WriteCounters};
use std::fmt;

const PLAIN_SCHEMES: [&str; 2] = ["bolt", "neo4j"];
const SECURE_SCHEMES: [&str; 4] = ["bolt+s", "bolt+ssc", "neo4j+s", "neo4j+ssc"];

/// Address and credentials of a Neo4j deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    uri: String,
    user: String,
    password: String,
    encrypted: Option<bool>,
}

impl Credentials {
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            encrypted: None,
        }
    }

    /// Request (or refuse) encryption explicitly. Left unset, the scheme decides.
    pub fn with_encryption(mut self, encrypted: bool) -> Self {
        self.encrypted = Some(encrypted);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn encrypted(&self) -> Option<bool> {
        self.encrypted
    }

    /// The address the driver should dial once the encryption flag is applied.
    pub fn endpoint(&self) -> Result<String> {
        resolve_endpoint(&self.uri, self.encrypted)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("encrypted", &self.encrypted)
            .finish()
    }
}

/// Apply an explicit encryption flag to a URI.
///
/// `bolt://` and `neo4j://` are upgraded to their `+s` form when encryption
/// is requested. Schemes that already carry a security suffix must not be
/// combined with an explicit flag.
pub fn resolve_endpoint(uri: &str, encrypted: Option<bool>) -> Result<String> {
    let (scheme, rest) = uri
        .split_once("://")
        .ok_or_else(|| IngestError::InvalidEndpoint(format!("missing scheme in '{uri}'")))?;
    if rest.is_empty() {
        return Err(IngestError::InvalidEndpoint(format!(
            "missing host in '{uri}'"
        )));
    }

    let scheme = scheme.to_ascii_lowercase();
    if PLAIN_SCHEMES.contains(&scheme.as_str()) {
        match encrypted {
            Some(true) => Ok(format!("{scheme}+s://{rest}")),
            _ => Ok(uri.to_string()),
        }
    } else if SECURE_SCHEMES.contains(&scheme.as_str()) {
        match encrypted {
            None => Ok(uri.to_string()),
            Some(_) => Err(IngestError::InvalidEndpoint(format!(
                "the encryption flag cannot be combined with the '{scheme}' scheme"
            ))),
        }
    } else {
        Err(IngestError::InvalidEndpoint(format!(
            "unsupported scheme '{scheme}'"
        )))
    }
}

/// A Cypher statement with its user parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    text: String,
    params: Params,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Opens connections to a database deployment.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Open a connection and verify it is usable.
    async fn connect(&self, credentials: &Credentials) -> Result<Self::Connection>;
}

/// A live, shareable handle to a database deployment.
#[async_trait]
pub trait Connection: Clone + Send + Sync + 'static {
    type Session: Session;

    /// `None` targets the server's default database.
    async fn open_session(&self, database: Option<&str>) -> Result<Self::Session>;
}

/// Runs statements, each in its own managed transaction.
///
/// Dropping a session releases it, on success and failure alike.
#[async_trait]
pub trait Session: Send {
    /// Run a write statement and commit. `rows` is bound as `$rows`.
    async fn run_write(
        &mut self,
        statement: &Statement,
        rows: Option<&RowBatch>,
    ) -> Result<WriteCounters>;

    /// Run a read statement and materialize every result row. A result
    /// without rows yields an empty dataset with no columns.
    async fn run_read(&mut self, statement: &Statement) -> Result<Dataset>;
}
