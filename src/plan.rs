//! Ingest plan files.
//!
//! A plan names the target database, the `pre_ingest` statements to run
//! first (constraints, indexes) and the data files to load:
//!
//! ```yaml
//! database: movies
//! pre_ingest:
//!   - CREATE CONSTRAINT person_name IF NOT EXISTS FOR (p:Person) REQUIRE p.name IS UNIQUE
//! datafiles:
//!   - url: file:///data/people.csv
//!     cypher: |
//!       UNWIND $rows AS row
//!       MERGE (p:Person {name: row.name}) SET p.born = toInteger(row.born)
//!     chunk_size: 5000
//!     partitions: 4
//!     mode: threaded
//! ```
//!
//! Keys are case-insensitive at the plan and data file level.

use anyhow::{bail, Context, Result};
use ingest_engine::{ExecutionMode, IngestOptions};
use ingest_types::Params;
use serde::Deserialize;
use serde_yaml::{Mapping, Value as YamlValue};
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// A parsed and validated ingest plan.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestPlan {
    /// Target database; `None` uses the server default.
    #[serde(default)]
    pub database: Option<String>,

    /// Write statements run once, before any data file.
    #[serde(default)]
    pub pre_ingest: Vec<String>,

    #[serde(default)]
    pub datafiles: Vec<DataFile>,
}

/// One or many Cypher statements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cypher {
    One(String),
    Many(Vec<String>),
}

impl Cypher {
    pub fn statements(&self) -> Vec<String> {
        match self {
            Cypher::One(statement) => vec![statement.clone()],
            Cypher::Many(statements) => statements.clone(),
        }
    }
}

/// A local delimited data file and how to load it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataFile {
    /// Local path or `file://` URL.
    pub url: String,

    /// Statement(s) applied to every chunk, in order.
    pub cypher: Cypher,

    /// Data records skipped after the header.
    #[serde(default)]
    pub skip_records: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_field_separator")]
    pub field_separator: char,

    #[serde(default)]
    pub skip_file: bool,

    #[serde(default = "default_partitions")]
    pub partitions: usize,

    #[serde(default)]
    pub mode: ExecutionMode,

    #[serde(default)]
    pub workers: Option<usize>,

    #[serde(default)]
    pub parameters: Params,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_field_separator() -> char {
    ','
}

fn default_partitions() -> usize {
    1
}

impl IngestPlan {
    /// Load a plan from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ingest plan: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid ingest plan: {}", path.display()))
    }

    /// Parse a plan from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: YamlValue = serde_yaml::from_str(yaml).context("Wrong YAML format")?;
        let mut root = match raw {
            YamlValue::Mapping(mapping) => lower_keys(mapping),
            YamlValue::Null => Mapping::new(),
            _ => bail!("An ingest plan must be a YAML mapping"),
        };

        if let Some(YamlValue::Sequence(files)) = root.get_mut("datafiles") {
            for file in files.iter_mut() {
                if let YamlValue::Mapping(mapping) = file {
                    *mapping = lower_keys(std::mem::take(mapping));
                }
            }
        }

        let plan: IngestPlan =
            serde_yaml::from_value(YamlValue::Mapping(root)).context("Missing or invalid keys")?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        for file in &self.datafiles {
            file.validate()?;
        }
        Ok(())
    }
}

impl DataFile {
    /// Resolve `url` to a local path.
    pub fn path(&self) -> Result<PathBuf> {
        let path = match self.url.split_once("://") {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("file") => PathBuf::from(rest),
            Some((scheme, _)) => bail!(
                "Error reading url {}: URL scheme {} not supported, only local paths and file:// are allowed",
                self.url,
                scheme.to_ascii_lowercase()
            ),
            None => PathBuf::from(&self.url),
        };

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .with_context(|| format!("Error reading url {}: No file extension found", self.url))?;
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            bail!(
                "Error reading url {}: File format {} not supported, only {} are allowed",
                self.url,
                extension,
                SUPPORTED_EXTENSIONS.join(", ")
            );
        }
        Ok(path)
    }

    /// The separator as the single byte the CSV reader expects.
    pub fn delimiter(&self) -> Result<u8> {
        u8::try_from(self.field_separator)
            .ok()
            .filter(u8::is_ascii)
            .with_context(|| {
                format!(
                    "Field separator {:?} of {} must be a single ASCII character",
                    self.field_separator, self.url
                )
            })
    }

    pub fn statements(&self) -> Vec<String> {
        self.cypher.statements()
    }

    /// Engine options for one chunk of this file.
    pub fn ingest_options(&self, database: Option<&str>) -> IngestOptions {
        IngestOptions {
            database: database.map(str::to_string),
            partitions: self.partitions,
            mode: self.mode,
            workers: self.workers,
            parameters: self.parameters.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        self.path()?;
        self.delimiter()?;
        if self.statements().is_empty() {
            bail!("No cypher statements configured for {}", self.url);
        }
        if self.chunk_size == 0 {
            bail!("chunk_size of {} must be greater than zero", self.url);
        }
        if self.partitions == 0 {
            bail!("partitions of {} must be greater than zero", self.url);
        }
        Ok(())
    }
}

fn lower_keys(mapping: Mapping) -> Mapping {
    mapping
        .into_iter()
        .map(|(key, value)| match key {
            YamlValue::String(key) => (YamlValue::String(key.to_lowercase()), value),
            other => (other, value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::Value;

    const PLAN: &str = r#"
Database: movies
PRE_INGEST:
  - CREATE CONSTRAINT person_name IF NOT EXISTS FOR (p:Person) REQUIRE p.name IS UNIQUE
  - CREATE INDEX movie_year IF NOT EXISTS FOR (m:Movie) ON (m.released)
DataFiles:
  - URL: file:///data/people.csv
    Cypher: |
      UNWIND $rows AS row
      MERGE (p:Person {name: row.name})
    chunk_size: 500
    Partitions: 4
    mode: parallel
    workers: 2
    parameters:
      sourceName: imdb
  - url: data/movies.TXT
    cypher:
      - "UNWIND $rows AS row MERGE (m:Movie {title: row.title})"
      - "UNWIND $rows AS row MATCH (m:Movie {title: row.title}) SET m.released = row.released"
    field_separator: "|"
    skip_records: 2
    skip_file: true
"#;

    #[test]
    fn test_parse_plan() {
        let plan = IngestPlan::from_yaml(PLAN).unwrap();
        assert_eq!(plan.database.as_deref(), Some("movies"));
        assert_eq!(plan.pre_ingest.len(), 2);
        assert_eq!(plan.datafiles.len(), 2);

        let people = &plan.datafiles[0];
        assert_eq!(people.path().unwrap(), PathBuf::from("/data/people.csv"));
        assert_eq!(
            people.statements(),
            vec!["UNWIND $rows AS row\nMERGE (p:Person {name: row.name})\n".to_string()]
        );
        assert_eq!(people.chunk_size, 500);
        assert_eq!(people.partitions, 4);
        assert_eq!(people.mode, ExecutionMode::Parallel);
        assert_eq!(people.workers, Some(2));
        // Parameter names keep their case.
        assert_eq!(
            people.parameters.get("sourceName"),
            Some(&Value::from("imdb"))
        );

        let movies = &plan.datafiles[1];
        assert_eq!(movies.statements().len(), 2);
        assert_eq!(
            movies.statements()[0],
            "UNWIND $rows AS row MERGE (m:Movie {title: row.title})"
        );
        assert_eq!(movies.delimiter().unwrap(), b'|');
        assert_eq!(movies.skip_records, 2);
        assert!(movies.skip_file);
    }

    #[test]
    fn test_defaults() {
        let plan =
            IngestPlan::from_yaml("datafiles:\n  - url: people.csv\n    cypher: RETURN 1\n")
                .unwrap();
        assert!(plan.database.is_none());
        assert!(plan.pre_ingest.is_empty());

        let file = &plan.datafiles[0];
        assert_eq!(file.skip_records, 0);
        assert_eq!(file.chunk_size, 1000);
        assert_eq!(file.field_separator, ',');
        assert!(!file.skip_file);
        assert_eq!(file.partitions, 1);
        assert_eq!(file.mode, ExecutionMode::Sequential);
        assert_eq!(file.workers, None);
        assert_eq!(file.ingest_options(Some("movies")).database.as_deref(), Some("movies"));
    }

    #[test]
    fn test_rejects_unsupported_sources() {
        let err = IngestPlan::from_yaml(
            "datafiles:\n  - url: s3://bucket/people.csv\n    cypher: RETURN 1\n",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("URL scheme s3 not supported"));

        let err =
            IngestPlan::from_yaml("datafiles:\n  - url: people.json\n    cypher: RETURN 1\n")
                .unwrap_err();
        assert!(format!("{err:#}").contains("File format json not supported"));

        let err = IngestPlan::from_yaml("datafiles:\n  - url: people\n    cypher: RETURN 1\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("No file extension found"));
    }

    #[test]
    fn test_missing_required_keys() {
        assert!(IngestPlan::from_yaml("datafiles:\n  - url: people.csv\n").is_err());
        assert!(IngestPlan::from_yaml("datafiles:\n  - cypher: RETURN 1\n").is_err());
        assert!(IngestPlan::from_yaml("- just\n- a list\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        fs::write(&path, PLAN).unwrap();
        assert_eq!(IngestPlan::from_file(&path).unwrap().datafiles.len(), 2);

        let err = IngestPlan::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read ingest plan"));
    }
}
