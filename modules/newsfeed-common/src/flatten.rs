//! Flattening of nested JSON objects into single-level, dot-keyed maps.
//!
//! `{"headline": {"main": "x"}}` becomes `{"headline.main": "x"}`. Only objects
//! are recursed into; arrays and scalars are leaves and are kept as they are.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Separator placed between ancestor keys in a composite key.
pub const FLATTEN_DELIMITER: &str = ".";

/// A leaf value in a flattened document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Arrays are opaque: their elements are stored untouched.
    List(Vec<Value>),
}

impl FlatValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlatValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlatValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FlatValue::Null)
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatValue::Null => f.write_str("null"),
            FlatValue::Bool(b) => write!(f, "{b}"),
            FlatValue::Number(n) => write!(f, "{n}"),
            FlatValue::String(s) => f.write_str(s),
            FlatValue::List(items) => write!(f, "{}", Value::Array(items.clone())),
        }
    }
}

/// Single-level map from composite key to leaf value.
///
/// Keys iterate in first-insertion order. Re-inserting a key replaces the value
/// but keeps the key's original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMap {
    entries: Vec<(String, FlatValue)>,
}

impl FlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value stored under `key`.
    pub fn insert(&mut self, key: String, value: FlatValue) -> Option<FlatValue> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, FlatValue)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (String, FlatValue)>>(iter: I) -> Self {
        let mut map = FlatMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for FlatMap {
    type Item = (String, FlatValue);
    type IntoIter = std::vec::IntoIter<(String, FlatValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for FlatMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Flatten `map` depth-first, prefixing every composite key with `parent_key`
/// when one is given. An empty prefix is the same as no prefix.
pub fn flatten(map: &Map<String, Value>, parent_key: Option<&str>) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(map, parent_key.filter(|p| !p.is_empty()), &mut out);
    out
}

fn flatten_into(map: &Map<String, Value>, parent_key: Option<&str>, out: &mut FlatMap) {
    for (key, value) in map {
        let composite = match parent_key {
            Some(parent) => format!("{parent}{FLATTEN_DELIMITER}{key}"),
            None => key.clone(),
        };

        let leaf = match value {
            Value::Object(nested) => {
                flatten_into(nested, Some(&composite), out);
                continue;
            }
            Value::Null => FlatValue::Null,
            Value::Bool(b) => FlatValue::Bool(*b),
            Value::Number(n) => FlatValue::Number(n.clone()),
            Value::String(s) => FlatValue::String(s.clone()),
            Value::Array(items) => FlatValue::List(items.clone()),
        };
        out.insert(composite, leaf);
    }
}
