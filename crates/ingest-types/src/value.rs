//! Dynamically typed values for dataset cells and statement parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named parameters bound to a statement.
pub type Params = BTreeMap<String, Value>;

/// A single cell or parameter value.
///
/// The variants cover what a Cypher parameter can carry. Temporal and spatial
/// types are read back as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Replace a missing value with the empty string.
    ///
    /// The row encoding has no null representation for batch cells, so the
    /// partitioner applies this to every cell before handoff.
    pub fn or_empty_string(self) -> Value {
        match self {
            Value::Null => Value::String(String::new()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_empty_string() {
        assert_eq!(Value::Null.or_empty_string(), Value::from(""));
        assert_eq!(Value::from(7).or_empty_string(), Value::Int(7));
        assert_eq!(Value::from("x").or_empty_string(), Value::from("x"));
    }

    #[test]
    fn test_params_from_yaml() {
        let yaml = r#"
title: The Matrix
released: 1999
rating: 8.7
tags: [action, sci-fi]
sequel: null
"#;
        let params: Params = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params["title"], Value::from("The Matrix"));
        assert_eq!(params["released"], Value::Int(1999));
        assert_eq!(params["rating"], Value::Float(8.7));
        assert_eq!(params["tags"], Value::from(vec!["action", "sci-fi"]));
        assert!(params["sequel"].is_null());
    }

    #[test]
    fn test_display() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::from(1));
        map.insert("b".to_string(), Value::from(vec![true, false]));
        assert_eq!(Value::Map(map).to_string(), "{a: 1, b: [true, false]}");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_serialize_json() {
        let value = Value::from(vec![Value::Null, Value::from(2), Value::from("x")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[null,2,"x"]"#);
    }
}
