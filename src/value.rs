//! Universal payload type for expected and actual outputs
//!
//! Case documents and target results are both expressed as [`ValueMap`]s so
//! they can be compared structurally without going through untyped objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping of field name to value, ordered by key
pub type ValueMap = BTreeMap<String, Value>;

/// Tagged union of everything a case document or target may produce
///
/// Integers and floats are both numbers: `Int(2)` equals `Float(2.0)`.
/// Numbers compare exactly; a float equals an integer only when it holds
/// that integer without rounding. No other cross-type equality exists;
/// `String("2")` never equals `Int(2)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                float_as_i64(*b) == Some(*a)
            }
            (Value::UInt(a), Value::Float(b)) | (Value::Float(b), Value::UInt(a)) => {
                float_as_u64(*b) == Some(*a)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

/// The integer a float holds exactly, if it is in range
fn float_as_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
}

fn float_as_u64(f: f64) -> Option<u64> {
    (f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64).then(|| f as u64)
}

impl fmt::Display for Value {
    /// Compact JSON rendering
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Value::UInt(v), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: serde_json::Value) -> Value {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_deserialize_variants() {
        assert_eq!(value(json!(null)), Value::Null);
        assert!(matches!(value(json!(true)), Value::Bool(true)));
        assert!(matches!(value(json!(3)), Value::Int(3)));
        assert!(matches!(value(json!(1.5)), Value::Float(_)));
        assert!(matches!(value(json!("x")), Value::String(_)));
        assert!(matches!(value(json!([1, 2])), Value::List(_)));
        assert!(matches!(value(json!({"a": 1})), Value::Map(_)));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let v: Value = serde_yaml::from_str("a: 1\nb: [x, ~]\nc: {d: false}\n").unwrap();
        let expected = value(json!({"a": 1, "b": ["x", null], "c": {"d": false}}));
        assert_eq!(v, expected);
    }

    #[test]
    fn test_numbers_compare_across_representations() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_large_integers_stay_exact() {
        let v: Value = serde_yaml::from_str("18446744073709551615").unwrap();
        assert!(matches!(v, Value::UInt(u64::MAX)));
        let w: Value = serde_yaml::from_str("18446744073709551614").unwrap();
        assert_ne!(v, w);

        assert_eq!(Value::from(5u64), Value::Int(5));
        assert_eq!(Value::Int(7), Value::UInt(7));
        assert_ne!(Value::Int(-1), Value::UInt(u64::MAX));
    }

    #[test]
    fn test_int_float_equality_does_not_round() {
        assert_ne!(Value::Int(9007199254740993), Value::Float(9007199254740992.0));
        assert_eq!(Value::Int(9007199254740992), Value::Float(9007199254740992.0));
        assert_ne!(Value::Int(i64::MAX), Value::Float(i64::MAX as f64));
        assert_ne!(Value::UInt(u64::MAX), Value::Float(u64::MAX as f64));
        assert_ne!(Value::Int(1), Value::Float(f64::NAN));
    }

    #[test]
    fn test_no_string_coercion() {
        assert_ne!(Value::from("2"), Value::Int(2));
        assert_ne!(Value::from("true"), Value::Bool(true));
        assert_ne!(Value::Null, Value::from(""));
    }

    #[test]
    fn test_nested_equality() {
        let a = value(json!({"x": [1, {"y": "z"}]}));
        let b = value(json!({"x": [1, {"y": "z"}]}));
        let c = value(json!({"x": [1, {"y": "w"}]}));
        let d = value(json!({"x": [{"y": "z"}, 1]}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_display_is_compact_json() {
        assert_eq!(value(json!({"a": [1, "b"]})).to_string(), r#"{"a":[1,"b"]}"#);
        assert_eq!(Value::Null.to_string(), "null");
    }
}
