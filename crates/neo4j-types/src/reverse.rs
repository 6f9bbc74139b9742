//! Reverse conversion: Neo4j BoltType → ingest values.
//!
//! Temporal values become ISO 8601 strings and points become maps with
//! `srid`, `x`, `y` (and `z`) keys, since [`Value`] has no native
//! representation for them. Graph structures (nodes, relationships, paths)
//! are rejected: read statements should return their properties instead.

use crate::error::{Neo4jTypesError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use ingest_types::Value;
use neo4rs::{BoltMap, BoltType, Row};
use std::collections::BTreeMap;

/// Convert a Bolt value to a [`Value`].
///
/// # Errors
///
/// Returns an error for:
/// - Node, Relation, UnboundedRelation, Path types
/// - temporal values chrono cannot represent
/// - NaN or Infinity float values
pub fn bolt_to_value(bolt: BoltType) -> Result<Value> {
    match bolt {
        BoltType::Null(_) => Ok(Value::Null),
        BoltType::Boolean(b) => Ok(Value::Bool(b.value)),
        BoltType::Integer(i) => Ok(Value::Int(i.value)),
        BoltType::Float(f) => {
            let f_val = f.value;
            if f_val.is_nan() {
                return Err(Neo4jTypesError::NanFloat);
            }
            if f_val.is_infinite() {
                return Err(Neo4jTypesError::InfinityFloat);
            }
            Ok(Value::Float(f_val))
        }
        BoltType::String(s) => Ok(Value::String(s.value)),
        BoltType::Bytes(b) => Ok(Value::String(hex::encode(&b.value))),
        BoltType::List(list) => {
            let items = list
                .value
                .into_iter()
                .map(bolt_to_value)
                .collect::<Result<Vec<Value>>>()?;
            Ok(Value::List(items))
        }
        BoltType::Map(map) => {
            let mut entries = BTreeMap::new();
            for (key, value) in map.value.into_iter() {
                entries.insert(key.to_string(), bolt_to_value(value)?);
            }
            Ok(Value::Map(entries))
        }

        BoltType::Date(date) => {
            let naive_date: NaiveDate =
                date.try_into().map_err(|e| Neo4jTypesError::InvalidDate {
                    reason: format!("Failed to convert BoltDate: {e}"),
                })?;
            Ok(Value::String(naive_date.format("%Y-%m-%d").to_string()))
        }
        BoltType::Time(time) => {
            let (naive_time, offset): (NaiveTime, FixedOffset) = time.into();
            Ok(Value::String(format!(
                "{}{}",
                naive_time.format("%H:%M:%S%.f"),
                offset
            )))
        }
        BoltType::LocalTime(local_time) => {
            let naive_time: NaiveTime = local_time.into();
            Ok(Value::String(naive_time.format("%H:%M:%S%.f").to_string()))
        }
        BoltType::DateTime(dt) => {
            let dt_with_offset: DateTime<FixedOffset> =
                dt.try_into()
                    .map_err(|e| Neo4jTypesError::InvalidDateTime {
                        reason: format!("Failed to convert BoltDateTime: {e}"),
                    })?;
            Ok(Value::String(dt_with_offset.to_rfc3339()))
        }
        BoltType::LocalDateTime(local_dt) => {
            let naive_dt: NaiveDateTime =
                local_dt
                    .try_into()
                    .map_err(|e| Neo4jTypesError::InvalidDateTime {
                        reason: format!("Failed to convert BoltLocalDateTime: {e}"),
                    })?;
            Ok(Value::String(
                naive_dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            ))
        }
        BoltType::DateTimeZoneId(dt_zone) => {
            let dt_with_offset: DateTime<FixedOffset> =
                (&dt_zone)
                    .try_into()
                    .map_err(|e| Neo4jTypesError::InvalidDateTime {
                        reason: format!("Failed to convert BoltDateTimeZoneId: {e}"),
                    })?;
            Ok(Value::String(dt_with_offset.to_rfc3339()))
        }
        BoltType::Duration(duration) => {
            let std_duration: std::time::Duration = duration.into();
            Ok(Value::String(format!("PT{}S", std_duration.as_secs_f64())))
        }

        BoltType::Point2D(point) => {
            let mut entries = BTreeMap::new();
            entries.insert("srid".to_string(), Value::Int(point.sr_id.value));
            entries.insert("x".to_string(), Value::Float(point.x.value));
            entries.insert("y".to_string(), Value::Float(point.y.value));
            Ok(Value::Map(entries))
        }
        BoltType::Point3D(point) => {
            let mut entries = BTreeMap::new();
            entries.insert("srid".to_string(), Value::Int(point.sr_id.value));
            entries.insert("x".to_string(), Value::Float(point.x.value));
            entries.insert("y".to_string(), Value::Float(point.y.value));
            entries.insert("z".to_string(), Value::Float(point.z.value));
            Ok(Value::Map(entries))
        }

        BoltType::Node(_) => Err(Neo4jTypesError::UnsupportedBoltType {
            bolt_type: "Node".to_string(),
        }),
        BoltType::Relation(_) => Err(Neo4jTypesError::UnsupportedBoltType {
            bolt_type: "Relation".to_string(),
        }),
        BoltType::UnboundedRelation(_) => Err(Neo4jTypesError::UnsupportedBoltType {
            bolt_type: "UnboundedRelation".to_string(),
        }),
        BoltType::Path(_) => Err(Neo4jTypesError::UnsupportedBoltType {
            bolt_type: "Path".to_string(),
        }),
    }
}

/// Read one result row as `(columns, values)`.
///
/// The driver hands rows over as a map and does not keep the server's column
/// order, so columns come back sorted by name. Every row of one result has the
/// same columns, so they line up across rows.
pub fn row_to_values(row: &Row) -> Result<(Vec<String>, Vec<Value>)> {
    let attributes = row.to::<BoltMap>().map_err(|e| Neo4jTypesError::Column {
        column: "*".to_string(),
        error: e.to_string(),
    })?;
    let mut fields: Vec<(String, BoltType)> = attributes
        .value
        .into_iter()
        .map(|(key, value)| (key.value, value))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut columns = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for (column, bolt) in fields {
        let value = bolt_to_value(bolt).map_err(|e| Neo4jTypesError::Column {
            column: column.clone(),
            error: e.to_string(),
        })?;
        columns.push(column);
        values.push(value);
    }
    Ok((columns, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4rs::{BoltDate, BoltFloat, BoltInteger, BoltList, BoltString};

    #[test]
    fn test_scalars() {
        assert_eq!(
            bolt_to_value(BoltType::String(BoltString::new("The Matrix"))).unwrap(),
            Value::from("The Matrix")
        );
        assert_eq!(
            bolt_to_value(BoltType::Integer(BoltInteger::new(1999))).unwrap(),
            Value::Int(1999)
        );
        assert_eq!(
            bolt_to_value(BoltType::Float(BoltFloat::new(8.7))).unwrap(),
            Value::Float(8.7)
        );
    }

    #[test]
    fn test_list() {
        let list: BoltType = vec![
            BoltType::Integer(BoltInteger::new(1)),
            BoltType::String(BoltString::new("two")),
        ]
        .into();
        assert_eq!(
            bolt_to_value(list).unwrap(),
            Value::List(vec![Value::Int(1), Value::from("two")])
        );

        let empty: BoltType = Vec::<BoltType>::new().into();
        assert_eq!(bolt_to_value(empty).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(matches!(
            bolt_to_value(BoltType::Float(BoltFloat::new(f64::NAN))),
            Err(Neo4jTypesError::NanFloat)
        ));
    }

    #[test]
    fn test_date_as_iso_string() {
        let date = BoltDate::from(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(
            bolt_to_value(BoltType::Date(date)).unwrap(),
            Value::from("2024-01-15")
        );
    }

    fn row(fields: Vec<(&str, BoltType)>) -> Row {
        let (names, data): (Vec<BoltType>, Vec<BoltType>) = fields
            .into_iter()
            .map(|(name, value)| (BoltType::String(BoltString::new(name)), value))
            .unzip();
        Row::new(BoltList::from(names), BoltList::from(data))
    }

    #[test]
    fn test_row_columns_sorted_by_name() {
        let row = row(vec![
            ("title", BoltType::String(BoltString::new("The Matrix"))),
            ("released", BoltType::Integer(BoltInteger::new(1999))),
            ("rating", BoltType::Float(BoltFloat::new(8.7))),
        ]);

        let (columns, values) = row_to_values(&row).unwrap();
        assert_eq!(columns, vec!["rating", "released", "title"]);
        assert_eq!(
            values,
            vec![Value::Float(8.7), Value::Int(1999), Value::from("The Matrix")]
        );
    }

    #[test]
    fn test_row_order_independent_of_field_order() {
        let forward = row(vec![
            ("a", BoltType::Integer(BoltInteger::new(1))),
            ("b", BoltType::Integer(BoltInteger::new(2))),
        ]);
        let backward = row(vec![
            ("b", BoltType::Integer(BoltInteger::new(2))),
            ("a", BoltType::Integer(BoltInteger::new(1))),
        ]);
        assert_eq!(
            row_to_values(&forward).unwrap(),
            row_to_values(&backward).unwrap()
        );
    }
}
