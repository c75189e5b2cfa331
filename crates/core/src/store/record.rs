//! Stored record shapes and JSON helpers shared by the collection operations.

use crate::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as held by a collection: the caller's value plus the
/// store-managed key and recency timestamp.
///
/// Serializes flat, with `key` and `timestamp` next to the value's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord<T> {
    pub key: String,
    /// Milliseconds since the Unix epoch of the last insert or update.
    pub timestamp: i64,
    #[serde(flatten)]
    pub value: T,
}

/// Input of [`Collection::put_all`](super::Collection::put_all).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// Bulk upsert keyed by the collection's key field.
    Many(Vec<T>),
    /// Insert of one new record keyed by the collection's key field.
    One(T),
}

impl<T> From<Vec<T>> for Payload<T> {
    fn from(values: Vec<T>) -> Self {
        Payload::Many(values)
    }
}

impl<T: DeserializeOwned> Payload<T> {
    /// Build a payload from untyped JSON.
    ///
    /// Arrays become [`Payload::Many`], objects become [`Payload::One`];
    /// every other shape is rejected.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        match value {
            Value::Array(items) => {
                let values = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        serde_json::from_value(item).map_err(|e| Error::InvalidRecord(format!("record {i}: {e}")))
                    })
                    .collect::<Result<Vec<T>, Error>>()?;
                Ok(Payload::Many(values))
            }
            Value::Object(_) => {
                let value = serde_json::from_value(value).map_err(|e| Error::InvalidRecord(e.to_string()))?;
                Ok(Payload::One(value))
            }
            other => Err(Error::InvalidInput(format!(
                "put_all expects a record or a list of records, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Row as read from the `records` table, before the body is decoded.
#[derive(Debug, Clone)]
pub(crate) struct RawRecord {
    pub key: String,
    pub body: String,
    pub timestamp: i64,
}

impl RawRecord {
    pub(crate) fn decode<T: DeserializeOwned>(self) -> Result<StoredRecord<T>, Error> {
        let value = serde_json::from_str(&self.body)
            .map_err(|e| Error::Serialization(format!("record `{}`: {e}", self.key)))?;
        Ok(StoredRecord { key: self.key, timestamp: self.timestamp, value })
    }
}

pub(crate) fn decode_all<T: DeserializeOwned>(rows: Vec<RawRecord>) -> Result<Vec<StoredRecord<T>>, Error> {
    rows.into_iter().map(RawRecord::decode).collect()
}

/// Serialize `value` and require a JSON object.
///
/// Returns `Ok(None)` when the value is some other shape, so callers can turn
/// that into their own rejection.
pub(crate) fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Option<Map<String, Value>>, Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Ok(None),
    }
}

/// The record's `name` field, the column searches match against.
pub(crate) fn name_of(object: &Map<String, Value>) -> Option<String> {
    object.get("name").and_then(Value::as_str).map(str::to_owned)
}

/// The record's key as stored: strings verbatim, integers in decimal.
pub(crate) fn key_of(object: &Map<String, Value>, key_field: &str) -> Option<String> {
    match object.get(key_field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Shallow merge: fields of `patch` replace those of `base`.
pub(crate) fn merge(mut base: Map<String, Value>, patch: Map<String, Value>) -> Map<String, Value> {
    base.extend(patch);
    base
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
