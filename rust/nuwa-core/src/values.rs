//! Runtime value representation for NuwaScript.
//!
//! Every value a script manipulates is JSON-shaped. Objects preserve
//! insertion order for rendering, while equality over them is
//! order-insensitive.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime value: the single universal datum of the language.
///
/// `Number` is always a double-precision float; operations that need an
/// integer (array indexing, loop counters) validate integrality at the
/// point of use. There is no `undefined` variant — a read that would
/// produce one surfaces `Null` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// The type name used in diagnostics ("null", "boolean", "number", ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Whether this is a `Number` carrying an exact integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_finite() && n.fract() == 0.0)
    }

    /// The quoted, round-trippable JSON form. Distinct from `Display`,
    /// which is the lossy user-facing rendering.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

impl fmt::Display for Value {
    /// The user-facing rendering used by `PRINT`, `FORMAT`, and the default
    /// state formatter. Strings appear without quotes; arrays as
    /// `[e1, e2]`; objects as `{k: v}` in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Object(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn display_scalars() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Number(13.0).to_string(), "13");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::String("hi".into()).to_string(), "hi");
    }

    #[test]
    fn display_containers() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::String("a".into()), Value::Null]);
        assert_eq!(arr.to_string(), "[1, a, null]");

        let obj = Value::Object(indexmap! {
            "x".to_string() => Value::Number(10.0),
            "y".to_string() => Value::Array(vec![Value::Bool(true)]),
        });
        assert_eq!(obj.to_string(), "{x: 10, y: [true]}");
    }

    #[test]
    fn object_equality_is_order_insensitive() {
        let a = Value::Object(indexmap! {
            "x".to_string() => Value::Number(1.0),
            "y".to_string() => Value::Number(2.0),
        });
        let b = Value::Object(indexmap! {
            "y".to_string() => Value::Number(2.0),
            "x".to_string() => Value::Number(1.0),
        });
        assert_eq!(a, b);
    }

    #[test]
    fn deep_equality() {
        let a = Value::Array(vec![Value::Object(indexmap! {
            "k".to_string() => Value::Array(vec![Value::Number(1.0)]),
        })]);
        let b = Value::Array(vec![Value::Object(indexmap! {
            "k".to_string() => Value::Array(vec![Value::Number(1.0)]),
        })]);
        let c = Value::Array(vec![Value::Object(indexmap! {
            "k".to_string() => Value::Array(vec![Value::Number(2.0)]),
        })]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn json_round_trip() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"name":"BTC","price":65000.5,"tags":["spot",null]}"#).unwrap();
        let value = Value::from(json.clone());
        assert_eq!(value.as_object().unwrap()["price"], Value::Number(65000.5));
        let back: serde_json::Value = value.into();
        assert_eq!(back, json);
    }

    #[test]
    fn json_integers_become_numbers() {
        let value = Value::from(serde_json::json!({"count": 3}));
        assert_eq!(value.as_object().unwrap()["count"], Value::Number(3.0));
    }

    #[test]
    fn json_string_is_quoted() {
        assert_eq!(Value::String("hi".into()).to_json_string(), "\"hi\"");
        assert_eq!(Value::Number(2.0).to_json_string(), "2.0");
    }

    #[test]
    fn integrality() {
        assert!(Value::Number(3.0).is_integer());
        assert!(!Value::Number(3.5).is_integer());
        assert!(!Value::Number(f64::NAN).is_integer());
        assert!(!Value::String("3".into()).is_integer());
    }
}
