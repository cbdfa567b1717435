// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::Validate;

use crate::store::Document;

/// One completed quiz session, stored in the `quiz_results` collection.
/// Attempts are written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub score: i64,
    pub total_questions: i64,
    pub timestamp: DateTime<Utc>,
}

impl Attempt {
    /// Builds an attempt from a stored document.
    ///
    /// A missing or empty `userId` makes the record unusable and yields `None`.
    /// Other absent fields fall back to defaults.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let user_id = doc.str_field("userId").filter(|id| !id.is_empty())?;

        Some(Self {
            id: doc.id.clone(),
            user_id: user_id.to_string(),
            category: doc.str_field("category").unwrap_or_default().to_string(),
            score: doc.int_field("score").unwrap_or(0),
            total_questions: doc.int_field("totalQuestions").unwrap_or(0),
            timestamp: doc.timestamp_field("timestamp").unwrap_or_else(Utc::now),
        })
    }

    /// Stored layout; the timestamp is kept as epoch milliseconds so it orders numerically.
    pub fn to_data(&self) -> Map<String, Value> {
        let value = json!({
            "userId": self.user_id,
            "category": self.category,
            "score": self.score,
            "totalQuestions": self.total_questions,
            "timestamp": self.timestamp.timestamp_millis(),
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Derived leaderboard row. Recomputed on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub user_id: String,
    pub display_name: String,
    pub total_score: i64,
}

/// Row of a category's top-scores board.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub score: i64,
    pub total_questions: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<Attempt> for CategoryScore {
    fn from(a: Attempt) -> Self {
        Self {
            score: a.score,
            total_questions: a.total_questions,
            timestamp: a.timestamp,
        }
    }
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 50))]
    pub category: String,

    /// User's answers map.
    /// Key: Question ID
    /// Value: the text of the chosen answer
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub result_id: String,
    pub category: String,
    pub score: i64,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total_questions: usize,
}
