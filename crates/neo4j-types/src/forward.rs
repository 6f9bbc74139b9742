//! Forward conversion: ingest values → Neo4j Bolt parameters.
//!
//! Row batches are sent as a single list-of-maps parameter named
//! [`ROWS_PARAM`]; the write statement iterates it server-side with
//! `UNWIND $rows AS row`.

use crate::error::{Neo4jTypesError, Result};
use ingest_types::{Params, RowBatch, Value};
use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltNull, BoltString, BoltType, Query};
use std::collections::HashMap;

/// Name of the parameter a row batch is bound to.
pub const ROWS_PARAM: &str = "rows";

/// Convert a [`Value`] to a Bolt value.
///
/// # Errors
///
/// Returns an error if a float (at any nesting depth) is NaN or infinite.
pub fn value_to_bolt(value: &Value) -> Result<BoltType> {
    match value {
        Value::Null => Ok(BoltType::Null(BoltNull)),
        Value::Bool(b) => Ok(BoltType::Boolean(BoltBoolean::new(*b))),
        Value::Int(i) => Ok(BoltType::Integer(BoltInteger::new(*i))),
        Value::Float(f) => {
            if f.is_nan() {
                Err(Neo4jTypesError::NanFloat)
            } else if f.is_infinite() {
                Err(Neo4jTypesError::InfinityFloat)
            } else {
                Ok(BoltType::Float(BoltFloat::new(*f)))
            }
        }
        Value::String(s) => Ok(BoltType::String(BoltString::new(s))),
        Value::List(items) => {
            let elements = items
                .iter()
                .map(value_to_bolt)
                .collect::<Result<Vec<BoltType>>>()?;
            Ok(elements.into())
        }
        Value::Map(map) => {
            let mut entries: HashMap<String, BoltType> = HashMap::with_capacity(map.len());
            for (key, item) in map {
                entries.insert(key.clone(), value_to_bolt(item)?);
            }
            Ok(entries.into())
        }
    }
}

/// Convert a row batch to the Bolt list-of-maps bound as `$rows`.
pub fn rows_to_bolt(batch: &RowBatch) -> Result<BoltType> {
    let mut rows: Vec<HashMap<String, BoltType>> = Vec::with_capacity(batch.len());
    for record in batch.records() {
        let mut row = HashMap::with_capacity(record.len());
        for (column, value) in record {
            row.insert(column.clone(), value_to_bolt(value)?);
        }
        rows.push(row);
    }
    Ok(rows.into())
}

/// Bind every parameter in `params` onto `query`.
pub fn bind_params(mut query: Query, params: &Params) -> Result<Query> {
    for (name, value) in params {
        query = query.param(name, value_to_bolt(value)?);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::Record;

    #[test]
    fn test_scalars() {
        assert!(matches!(
            value_to_bolt(&Value::from("hello")).unwrap(),
            BoltType::String(s) if s.value == "hello"
        ));
        assert!(matches!(
            value_to_bolt(&Value::from(42)).unwrap(),
            BoltType::Integer(i) if i.value == 42
        ));
        assert!(matches!(
            value_to_bolt(&Value::from(true)).unwrap(),
            BoltType::Boolean(b) if b.value
        ));
        assert!(matches!(
            value_to_bolt(&Value::Null).unwrap(),
            BoltType::Null(_)
        ));
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        assert!(matches!(
            value_to_bolt(&Value::Float(f64::NAN)),
            Err(Neo4jTypesError::NanFloat)
        ));
        assert!(matches!(
            value_to_bolt(&Value::from(vec![Value::Float(f64::INFINITY)])),
            Err(Neo4jTypesError::InfinityFloat)
        ));
    }

    #[test]
    fn test_rows_to_bolt() {
        let mut record = Record::new();
        record.insert("name".to_string(), Value::from("Keanu Reeves"));
        record.insert("born".to_string(), Value::from(1964));
        let batch = RowBatch::new(vec![record.clone(), record]);

        match rows_to_bolt(&batch).unwrap() {
            BoltType::List(list) => {
                assert_eq!(list.value.len(), 2);
                assert!(matches!(list.value[0], BoltType::Map(_)));
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }
}
