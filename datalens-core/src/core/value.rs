//! The dynamically typed cell value shared by every table operation.
//!
//! Source rows arrive with unknown types: a database driver hands back typed
//! scalars, while file-sourced cells arrive as text regardless of logical
//! type. [`Value`] carries both without loss; the type inferencer
//! ([`crate::core::inference`]) later decides what a whole column means.

use chrono::NaiveDateTime;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single cell in a tabular result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value. A source field that is absent from a record is stored
    /// as `Null`, never omitted.
    Null,
    /// Integer number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Temporal value without timezone.
    Timestamp(NaiveDateTime),
    /// Text, including numerals and date strings not yet reinterpreted.
    Text(String),
}

/// A hashable identity for a [`Value`], used for group-by partitioning and
/// key-column joins.
///
/// Numeric-capable values share one key space regardless of encoding: `5`,
/// `5.0`, and `"5"` all fold into the same integer key, and `"2.5"` keys
/// like `2.5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Int(i64),
    /// Raw bit pattern of a float that does not fold into an integer.
    FloatBits(u64),
    Bool(bool),
    Timestamp(i64),
    Text(String),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion used by statistics, aggregation, and ordered filter
    /// clauses. Integers, floats, and text numerals coerce; everything else
    /// (including booleans and nulls) does not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Returns the text content for text values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The grouping/join identity of this value. See [`ValueKey`].
    ///
    /// Keys follow the same cross-representation rules as
    /// [`Value::loosely_equals`]: numeric-capable text folds into the
    /// numeric key, so a database `1` and a file-sourced `"1"` land in the
    /// same group and join on the same key.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => numeric_key(*f),
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Timestamp(ts) => ValueKey::Timestamp(ts.and_utc().timestamp_micros()),
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => numeric_key(n),
                Err(_) => ValueKey::Text(s.clone()),
            },
        }
    }

    /// Loose equality across representations: numeric-capable values compare
    /// as numbers, booleans as booleans, everything else by rendered text.
    /// Null equals nothing, not even another null.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a == b;
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    /// Renders the value the way the exporter writes it. Null renders empty.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// Whole finite floats fold into the integer key; everything else keeps its
/// bit pattern.
fn numeric_key(f: f64) -> ValueKey {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
        ValueKey::Int(f as i64)
    } else {
        ValueKey::FloatBits(f.to_bits())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Timestamp(ts) => {
                serializer.serialize_str(&ts.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON scalar (null, number, boolean, or string)")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        if v <= i64::MAX as u64 {
            Ok(Value::Int(v as i64))
        } else {
            Ok(Value::Float(v as f64))
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::Text(v))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(42).as_number(), Some(42.0));
        assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Text("42".into()).as_number(), Some(42.0));
        assert_eq!(Value::Text(" 3.5 ".into()).as_number(), Some(3.5));
        assert_eq!(Value::Text("abc".into()).as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_display_rendering() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Float(5.0).to_string(), "5");
        assert_eq!(Value::Float(2.25).to_string(), "2.25");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Text("x,y".into()).to_string(), "x,y");
    }

    #[test]
    fn test_group_key_folds_whole_floats() {
        assert_eq!(Value::Float(5.0).key(), Value::Int(5).key());
        assert_ne!(Value::Float(5.5).key(), Value::Int(5).key());
        assert_eq!(Value::Null.key(), ValueKey::Null);
    }

    #[test]
    fn test_group_key_folds_numeric_text() {
        assert_eq!(Value::Text("1".into()).key(), Value::Int(1).key());
        assert_eq!(Value::Text("2.5".into()).key(), Value::Float(2.5).key());
        assert_ne!(Value::Text("x".into()).key(), Value::Int(1).key());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Int(42).loosely_equals(&Value::Text("42".into())));
        assert!(Value::Float(1.5).loosely_equals(&Value::Text("1.5".into())));
        assert!(Value::Bool(true).loosely_equals(&Value::Bool(true)));
        assert!(!Value::Null.loosely_equals(&Value::Null));
        assert!(!Value::Text("a".into()).loosely_equals(&Value::Text("b".into())));
    }

    #[test]
    fn test_serde_scalars() {
        let json = serde_json::to_string(&Value::Int(3)).unwrap();
        assert_eq!(json, "3");
        let back: Value = serde_json::from_str("3").unwrap();
        assert_eq!(back, Value::Int(3));

        let back: Value = serde_json::from_str("null").unwrap();
        assert_eq!(back, Value::Null);

        let back: Value = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(back, Value::Text("hello".into()));
    }

    #[test]
    fn test_timestamp_rendering() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-03-01 12:30:00");
    }
}
