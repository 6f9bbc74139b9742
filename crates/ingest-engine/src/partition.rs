//! Splits a dataset into contiguous, nearly equal row batches.

use crate::error::{IngestError, Result};
use ingest_types::{Dataset, Record, RowBatch};

/// Split `dataset` into exactly `partitions` batches.
///
/// The first `rows % partitions` batches hold one extra row. Order is kept
/// within and across batches, and null cells become empty strings.
pub fn partition(dataset: &Dataset, partitions: usize) -> Result<Vec<RowBatch>> {
    let rows = dataset.row_count();
    if partitions == 0 || partitions > rows {
        return Err(IngestError::InvalidPartitionCount { partitions, rows });
    }

    let base = rows / partitions;
    let extra = rows % partitions;
    let mut records = dataset.records().map(normalize);

    let batches = (0..partitions)
        .map(|index| {
            let size = if index < extra { base + 1 } else { base };
            records.by_ref().take(size).collect::<RowBatch>()
        })
        .collect();
    Ok(batches)
}

fn normalize(record: Record) -> Record {
    record
        .into_iter()
        .map(|(column, value)| (column, value.or_empty_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::Value;

    fn numbered(rows: usize) -> Dataset {
        let rows = (0..rows as i64).map(|i| vec![Value::from(i)]).collect();
        Dataset::new(vec!["id".to_string()], rows).unwrap()
    }

    fn ids(batch: &RowBatch) -> Vec<i64> {
        batch
            .records()
            .iter()
            .map(|record| record["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_uneven_split_front_loads_extra_rows() {
        let batches = partition(&numbered(10), 3).unwrap();
        let sizes: Vec<usize> = batches.iter().map(RowBatch::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(ids(&batches[0]), vec![0, 1, 2, 3]);
        assert_eq!(ids(&batches[2]), vec![7, 8, 9]);
    }

    #[test]
    fn test_every_row_once_in_order() {
        for n in 1..=17 {
            let batches = partition(&numbered(17), n).unwrap();
            assert_eq!(batches.len(), n);
            let all: Vec<i64> = batches.iter().flat_map(ids).collect();
            assert_eq!(all, (0..17).collect::<Vec<_>>());

            let max = batches.iter().map(RowBatch::len).max().unwrap();
            let min = batches.iter().map(RowBatch::len).min().unwrap();
            assert!(max - min <= 1);
        }
    }

    #[test]
    fn test_invalid_counts() {
        assert!(matches!(
            partition(&numbered(5), 10),
            Err(IngestError::InvalidPartitionCount {
                partitions: 10,
                rows: 5
            })
        ));
        assert!(matches!(
            partition(&numbered(5), 0),
            Err(IngestError::InvalidPartitionCount { partitions: 0, .. })
        ));
        assert!(matches!(
            partition(&numbered(0), 1),
            Err(IngestError::InvalidPartitionCount { rows: 0, .. })
        ));
    }

    #[test]
    fn test_nulls_normalized() {
        let dataset = Dataset::new(
            vec!["name".to_string(), "born".to_string()],
            vec![vec![Value::from("Carrie-Anne Moss"), Value::Null]],
        )
        .unwrap();
        let batches = partition(&dataset, 1).unwrap();
        assert_eq!(batches[0].records()[0]["born"], Value::from(""));
        assert_eq!(
            batches[0].records()[0]["name"],
            Value::from("Carrie-Anne Moss")
        );
    }
}
