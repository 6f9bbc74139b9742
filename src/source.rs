//! Chunked CSV reading into [`Dataset`]s.

use crate::plan::DataFile;
use anyhow::{Context, Result};
use ingest_types::{Dataset, Value};
use std::fs::File;
use std::io::Read;

/// Reads a delimited file with a header row in chunks of `chunk_size`
/// records. Every cell is a string; empty cells become [`Value::Null`].
pub struct CsvSource {
    reader: csv::Reader<Box<dyn Read + Send>>,
    columns: Vec<String>,
    chunk_size: usize,
    source_name: String,
    records_read: u64,
}

impl CsvSource {
    /// Open the local file a plan entry points at.
    pub fn open(datafile: &DataFile) -> Result<Self> {
        let path = datafile.path()?;
        let file = File::open(&path)
            .with_context(|| format!("Failed to open data file: {}", path.display()))?;
        tracing::info!("Processing csv {}", path.display());
        Self::from_reader(
            Box::new(file),
            datafile.delimiter()?,
            datafile.skip_records,
            datafile.chunk_size,
            path.display().to_string(),
        )
    }

    pub fn from_reader(
        reader: Box<dyn Read + Send>,
        delimiter: u8,
        skip_records: usize,
        chunk_size: usize,
        source_name: impl Into<String>,
    ) -> Result<Self> {
        let source_name = source_name.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let columns = reader
            .headers()
            .with_context(|| format!("Failed to read CSV headers of {source_name}"))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<String>>();

        let mut source = Self {
            reader,
            columns,
            chunk_size: chunk_size.max(1),
            source_name,
            records_read: 0,
        };

        let mut record = csv::StringRecord::new();
        for _ in 0..skip_records {
            if !source.read(&mut record)? {
                break;
            }
        }
        Ok(source)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The next chunk, or `None` once the file is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<Dataset>> {
        let mut dataset = Dataset::with_columns(self.columns.clone())
            .with_context(|| format!("Invalid CSV header in {}", self.source_name))?;
        let mut record = csv::StringRecord::new();

        while dataset.row_count() < self.chunk_size && self.read(&mut record)? {
            if record.len() > self.columns.len() {
                // Lines with extra fields are dropped, not loaded misaligned.
                tracing::warn!(
                    "Skipping record {} of {}: expected {} fields, found {}",
                    self.records_read,
                    self.source_name,
                    self.columns.len(),
                    record.len()
                );
                continue;
            }
            let row = (0..self.columns.len())
                .map(|i| match record.get(i) {
                    Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                    _ => Value::Null,
                })
                .collect();
            dataset
                .push_row(row)
                .with_context(|| format!("Invalid record in {}", self.source_name))?;
        }

        if dataset.is_empty() {
            Ok(None)
        } else {
            Ok(Some(dataset))
        }
    }

    fn read(&mut self, record: &mut csv::StringRecord) -> Result<bool> {
        let more = self
            .reader
            .read_record(record)
            .with_context(|| format!("Failed to read CSV record from {}", self.source_name))?;
        if more {
            self.records_read += 1;
        }
        Ok(more)
    }
}

impl Iterator for CsvSource {
    type Item = Result<Dataset>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(data: &'static str, skip: usize, chunk: usize) -> CsvSource {
        CsvSource::from_reader(Box::new(data.as_bytes()), b',', skip, chunk, "test.csv").unwrap()
    }

    const PEOPLE: &str = "name,born\nKeanu Reeves,1964\nCarrie-Anne Moss,\nHugo Weaving,1960\n";

    #[test]
    fn test_reads_strings_and_nulls() {
        let mut csv = source(PEOPLE, 0, 10);
        assert_eq!(csv.columns().to_vec(), vec!["name", "born"]);

        let chunk = csv.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.row_count(), 3);
        assert_eq!(chunk.get(0, "born"), Some(&Value::from("1964")));
        assert_eq!(chunk.get(1, "born"), Some(&Value::Null));
        assert!(csv.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_chunks_and_skip() {
        let chunks: Vec<Dataset> = source(PEOPLE, 1, 1).collect::<Result<_>>().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].get(0, "name"),
            Some(&Value::from("Carrie-Anne Moss"))
        );
        assert_eq!(chunks[1].get(0, "name"), Some(&Value::from("Hugo Weaving")));
    }

    #[test]
    fn test_ragged_lines() {
        let data = "name,born\nKeanu Reeves\nLaurence Fishburne,1961,extra\nHugo Weaving,1960\n";
        let chunk = source(data, 0, 10).next_chunk().unwrap().unwrap();
        assert_eq!(chunk.row_count(), 2);
        assert_eq!(chunk.get(0, "born"), Some(&Value::Null));
        assert_eq!(chunk.get(1, "name"), Some(&Value::from("Hugo Weaving")));
    }

    #[test]
    fn test_custom_delimiter() {
        let data = "title|released\nThe Matrix|1999\n";
        let mut csv =
            CsvSource::from_reader(Box::new(data.as_bytes()), b'|', 0, 10, "movies.txt").unwrap();
        let chunk = csv.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.get(0, "released"), Some(&Value::from("1999")));
    }
}
