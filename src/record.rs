//! Record identifiers and field access
//!
//! Records are opaque JSON objects. Only the id and parent id fields are
//! interpreted, and only after normalisation into a [`RecordId`]: numeric
//! strings collapse onto integers so that rows exported with string ids
//! (`"id": "3"`) still match integer parent references (`"parent_id": 3`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One caller-supplied row. Arbitrary fields; the engine reads the
/// id/parent/name columns through [`crate::FieldAliases`].
pub type Record = Map<String, Value>;

/// Normalised node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Normalise a JSON value into an id.
    ///
    /// Integers and integral floats become `Int`, numeric strings become
    /// `Int`, other non-empty strings become `Str`. Everything else
    /// (null, booleans, fractional numbers, arrays, objects, empty strings)
    /// is not a usable id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(RecordId::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(RecordId::Str(u.to_string()))
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                        Some(RecordId::Int(f as i64))
                    } else {
                        None
                    }
                }
            }
            Value::String(s) if !s.is_empty() => Some(Self::from(s.as_str())),
            _ => None,
        }
    }

    /// Short description of a JSON value's kind, for error messages
    pub(crate) fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a non-integral number",
            Value::String(_) => "an empty string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(i) => RecordId::Int(i),
            Err(_) => RecordId::Str(value.to_string()),
        }
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        match value.parse::<i64>() {
            Ok(i) => RecordId::Int(i),
            Err(_) => RecordId::Str(value),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RecordId::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "expected an integer or string id, found {}",
                RecordId::describe(&value)
            ))
        })
    }
}

/// Read the parent reference of a row.
///
/// Absent, null and empty-string parents attach to `root`.
pub(crate) fn parent_of(
    record: &Record,
    field: &str,
    root: &RecordId,
) -> Result<RecordId, &'static str> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(root.clone()),
        Some(Value::String(s)) if s.is_empty() => Ok(root.clone()),
        Some(value) => RecordId::from_value(value).ok_or_else(|| RecordId::describe(value)),
    }
}

/// Read a display name, stringifying scalars
pub(crate) fn name_of(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
