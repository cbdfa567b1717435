// src/store/memory.rs

use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{DataStore, Direction, Document, OrderedQuery, StoreError};

/// In-process document store.
///
/// Used when no database is configured and by the integration tests.
/// Each collection keeps its documents in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rank of a JSON type when values of different types are compared.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn fetch_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc.data.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn fetch_ordered(
        &self,
        collection: &str,
        query: &OrderedQuery,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|doc| match &query.filter {
                Some(filter) => doc.data.get(&filter.field) == Some(&filter.value),
                None => true,
            })
            .filter(|doc| doc.data.contains_key(&query.order_by))
            .cloned()
            .collect();

        // `sort_by` is stable, so ties keep insertion order.
        matched.sort_by(|a, b| {
            let ord = compare_values(&a.data[&query.order_by], &b.data[&query.order_by]);
            match query.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), data));
        Ok(id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.data = data,
            None => docs.push(Document::new(id, data)),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        Ok(docs.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn add_then_get_and_delete() {
        let store = MemoryStore::new();
        let id = store
            .add("questions", object(json!({"questionText": "Q1"})))
            .await
            .unwrap();

        let doc = store.get("questions", &id).await.unwrap().unwrap();
        assert_eq!(doc.str_field("questionText"), Some("Q1"));

        assert!(store.delete("questions", &id).await.unwrap());
        assert!(!store.delete("questions", &id).await.unwrap());
        assert!(store.get("questions", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_ordered_filters_sorts_and_limits() {
        let store = MemoryStore::new();
        for (category, score) in [("Art", 3), ("Art", 9), ("Music", 20), ("Art", 5), ("Art", 9)] {
            store
                .add("quiz_results", object(json!({"category": category, "score": score})))
                .await
                .unwrap();
        }
        store
            .add("quiz_results", object(json!({"category": "Art"})))
            .await
            .unwrap();

        let query = OrderedQuery::new("score", Direction::Descending)
            .filter("category", "Art")
            .limit(3);
        let docs = store.fetch_ordered("quiz_results", &query).await.unwrap();
        let scores: Vec<i64> = docs.iter().filter_map(|d| d.int_field("score")).collect();
        assert_eq!(scores, vec![9, 9, 5]);
    }

    #[tokio::test]
    async fn set_replaces_in_place() {
        let store = MemoryStore::new();
        store
            .set("users", "u1", object(json!({"name": "Ada"})))
            .await
            .unwrap();
        store
            .set("users", "u1", object(json!({"name": "Grace"})))
            .await
            .unwrap();

        let all = store.fetch_all("users").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].str_field("name"), Some("Grace"));
    }

    #[tokio::test]
    async fn fetch_by_field_on_missing_collection_is_empty() {
        let store = MemoryStore::new();
        let docs = store
            .fetch_by_field("questions", "category", &json!("Art"))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }
}
