//! Tabular datasets and row batches.

use crate::error::DatasetError;
use crate::value::Value;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// One row keyed by column name.
pub type Record = BTreeMap<String, Value>;

/// An in-memory table: ordered column names and rows of values.
///
/// Every row holds exactly one value per column. Missing cells are
/// [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, checking that column names are unique and every row
    /// has one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.clone()));
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// An empty dataset with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Result<Self, DatasetError> {
        Self::new(columns, Vec::new())
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), DatasetError> {
        if row.len() != self.columns.len() {
            return Err(DatasetError::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// The value at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Row `index` keyed by column name.
    pub fn record(&self, index: usize) -> Option<Record> {
        self.rows.get(index).map(|row| self.to_record(row))
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(|row| self.to_record(row))
    }

    fn to_record(&self, row: &[Value]) -> Record {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }
}

/// One partition of a dataset, bound to a write statement as `$rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowBatch {
    records: Vec<Record>,
}

impl RowBatch {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for RowBatch {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Dataset {
        Dataset::new(
            vec!["name".to_string(), "born".to_string()],
            vec![
                vec![Value::from("Keanu Reeves"), Value::from(1964)],
                vec![Value::from("Carrie-Anne Moss"), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = Dataset::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::from(1)]],
        );
        assert_eq!(
            result,
            Err(DatasetError::RaggedRow {
                row: 0,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Dataset::with_columns(vec!["a".to_string(), "a".to_string()]);
        assert_eq!(result, Err(DatasetError::DuplicateColumn("a".to_string())));
    }

    #[test]
    fn test_column_access() {
        let dataset = people();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_count(), 2);
        assert_eq!(
            dataset.column("name").unwrap(),
            vec![&Value::from("Keanu Reeves"), &Value::from("Carrie-Anne Moss")]
        );
        assert_eq!(dataset.get(1, "born"), Some(&Value::Null));
        assert!(dataset.column("missing").is_none());
    }

    #[test]
    fn test_records() {
        let dataset = people();
        let record = dataset.record(0).unwrap();
        assert_eq!(record["name"], Value::from("Keanu Reeves"));
        assert_eq!(record["born"], Value::from(1964));
        assert_eq!(dataset.records().count(), 2);
    }

    #[test]
    fn test_push_row() {
        let mut dataset = Dataset::with_columns(vec!["x".to_string()]).unwrap();
        dataset.push_row(vec![Value::from(1)]).unwrap();
        assert!(dataset.push_row(vec![]).is_err());
        assert_eq!(dataset.row_count(), 1);
    }
}
