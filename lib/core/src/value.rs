//! Typed cell values
//!
//! A [`Value`] is one cell of a [`Dataset`](crate::Dataset). Continuous columns
//! hold numbers; binary, nominal and ordinal columns are compared through a
//! canonical category key so that `1`, `1.0` and `"1"` name the same level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Explicit missing marker (`null` in JSON)
    #[default]
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            _ => None,
        }
    }

    /// Canonical key used to compare categorical values.
    ///
    /// Returns `None` for missing values. Integral numbers are printed without
    /// a fractional part.
    pub fn category_key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Number(x) => Some(number_key(*x)),
        }
    }
}

fn number_key(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NA"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Number(x as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_key_normalizes_integral_numbers() {
        assert_eq!(Value::Number(1.0).category_key(), Some("1".to_string()));
        assert_eq!(Value::Number(2.5).category_key(), Some("2.5".to_string()));
        assert_eq!(Value::Text("1".into()).category_key(), Some("1".to_string()));
        assert_eq!(Value::Bool(true).category_key(), Some("true".to_string()));
        assert_eq!(Value::Missing.category_key(), None);
    }

    #[test]
    fn test_json_null_is_missing() {
        let row: Vec<Value> = serde_json::from_str(r#"[1.5, null, "red", true]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Value::Number(1.5),
                Value::Missing,
                Value::Text("red".into()),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<f64>), Value::Missing);
        assert_eq!(Value::from(Some(2.0)), Value::Number(2.0));
    }
}
