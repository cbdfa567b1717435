// src/store/mod.rs

//! Document store collaborator.
//!
//! Every persistent record lives in a named collection as a JSON object keyed by a
//! store-assigned string id. Querying and ordering are delegated to the backend;
//! the rest of the crate only sees [`Document`]s.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const QUESTIONS: &str = "questions";
pub const QUIZ_RESULTS: &str = "quiz_results";
pub const USERS: &str = "users";

/// A single record fetched from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Reads an integer field. Floating point values are truncated.
    pub fn int_field(&self, name: &str) -> Option<i64> {
        let value = self.data.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// Reads a timestamp stored either as epoch milliseconds or as an RFC 3339 string.
    pub fn timestamp_field(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.data.get(name)? {
            Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter applied before ordering.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Parameters for [`DataStore::fetch_ordered`].
///
/// Documents that lack the ordering field are excluded from the result.
#[derive(Debug, Clone)]
pub struct OrderedQuery {
    pub filter: Option<FieldFilter>,
    pub order_by: String,
    pub direction: Direction,
    pub limit: Option<usize>,
}

impl OrderedQuery {
    pub fn new(order_by: impl Into<String>, direction: Direction) -> Self {
        Self {
            filter: None,
            order_by: order_by.into(),
            direction,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    Backend(String),
    /// A record could not be encoded or decoded.
    Codec(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
            StoreError::Codec(msg) => write!(f, "store codec error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    /// All documents of a collection, in insertion order.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents whose `field` equals `value`, in insertion order.
    async fn fetch_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Documents ordered by a field. Ties keep insertion order.
    async fn fetch_ordered(
        &self,
        collection: &str,
        query: &OrderedQuery,
    ) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Inserts a record and returns its generated id.
    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String, StoreError>;

    /// Creates or fully replaces the record at `id`.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Returns `false` when no record with that id existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

/// Serializes a record into the JSON object layout stored in a collection.
pub fn to_object<T: serde::Serialize>(record: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Codec(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => Document::new("d1", map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn int_field_accepts_floats() {
        let d = doc(json!({"score": 7.9, "total": 20}));
        assert_eq!(d.int_field("score"), Some(7));
        assert_eq!(d.int_field("total"), Some(20));
        assert_eq!(d.int_field("missing"), None);
    }

    #[test]
    fn timestamp_field_reads_millis_and_rfc3339() {
        let d = doc(json!({
            "millis": 1_700_000_000_000i64,
            "text": "2023-11-14T22:13:20Z",
            "bogus": true
        }));
        let millis = d.timestamp_field("millis").unwrap();
        let text = d.timestamp_field("text").unwrap();
        assert_eq!(millis, text);
        assert!(d.timestamp_field("bogus").is_none());
    }
}
