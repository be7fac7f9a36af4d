use std::collections::BTreeMap;
use std::path::Path;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Normalized value model for run-specification hashing.
///
/// Every input to the canonicalizer is converted into this closed set of
/// variants before encoding. Mappings sort their keys by construction, so a
/// normalized tree serializes identically no matter how the caller ordered
/// or typed the original data.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<CanonValue>),
    Map(BTreeMap<String, CanonValue>),
}

impl CanonValue {
    /// Normalizes a filesystem path to its display string. Lossy on
    /// non-UTF-8 paths.
    pub fn from_path(path: &Path) -> Self {
        CanonValue::Str(path.display().to_string())
    }

    /// Normalizes a byte string to UTF-8, replacing invalid sequences.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        CanonValue::Str(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Best-effort fallback for opaque values: their display string. Not
    /// reversible; documented as lossy.
    pub fn from_display(value: impl std::fmt::Display) -> Self {
        CanonValue::Str(value.to_string())
    }

    /// Normalizes a mapping of JSON values, coercing keys to strings.
    pub fn map_from_json(map: &BTreeMap<String, Value>) -> BTreeMap<String, CanonValue> {
        map.iter()
            .map(|(key, value)| (key.clone(), CanonValue::from(value.clone())))
            .collect()
    }
}

impl From<Value> for CanonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CanonValue::Null,
            Value::Bool(flag) => CanonValue::Bool(flag),
            Value::Number(num) => {
                if let Some(int) = num.as_i64() {
                    CanonValue::Int(int)
                } else if let Some(float) = num.as_f64() {
                    // u64 beyond i64::MAX and non-integral numbers land here.
                    CanonValue::Float(float)
                } else {
                    CanonValue::from_display(num)
                }
            }
            Value::String(text) => CanonValue::Str(text),
            Value::Array(items) => {
                CanonValue::Seq(items.into_iter().map(CanonValue::from).collect())
            }
            Value::Object(fields) => CanonValue::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, CanonValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for CanonValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CanonValue::Null => serializer.serialize_unit(),
            CanonValue::Bool(flag) => serializer.serialize_bool(*flag),
            CanonValue::Int(int) => serializer.serialize_i64(*int),
            CanonValue::Float(float) => serializer.serialize_f64(*float),
            CanonValue::Str(text) => serializer.serialize_str(text),
            CanonValue::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            CanonValue::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
