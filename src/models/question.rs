// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::Validate;

use super::not_blank;
use crate::{store::Document, utils::html::clean_html};

/// A multiple-choice question stored in the `questions` collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub answer_a: String,
    pub answer_b: String,
    pub answer_c: String,
    pub answer_d: String,
    /// Must equal the text of one of the four answers.
    pub correct_answer: String,
    pub category: String,
}

/// Normalized identity used to detect duplicate questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestionKey {
    pub question_text: String,
    pub category: String,
    pub correct_answer: String,
}

impl Question {
    /// Builds a question from a stored document.
    /// Returns `None` when any text field is missing.
    pub fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.id.clone(),
            question_text: doc.str_field("questionText")?.to_string(),
            answer_a: doc.str_field("answerA")?.to_string(),
            answer_b: doc.str_field("answerB")?.to_string(),
            answer_c: doc.str_field("answerC")?.to_string(),
            answer_d: doc.str_field("answerD")?.to_string(),
            correct_answer: doc.str_field("correctAnswer")?.to_string(),
            category: doc.str_field("category")?.to_string(),
        })
    }

    /// Stored layout. The id is owned by the store and not repeated in the body.
    pub fn to_data(&self) -> Map<String, Value> {
        let value = json!({
            "questionText": self.question_text,
            "answerA": self.answer_a,
            "answerB": self.answer_b,
            "answerC": self.answer_c,
            "answerD": self.answer_d,
            "correctAnswer": self.correct_answer,
            "category": self.category,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn options(&self) -> [&str; 4] {
        [
            self.answer_a.as_str(),
            self.answer_b.as_str(),
            self.answer_c.as_str(),
            self.answer_d.as_str(),
        ]
    }

    pub fn key(&self) -> QuestionKey {
        QuestionKey {
            question_text: self.question_text.trim().to_string(),
            category: self.category.trim().to_string(),
            correct_answer: self.correct_answer.trim().to_string(),
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// DTO for sending a question to a player (excludes the correct answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub category: String,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        let options = q.options().iter().map(|o| o.to_string()).collect();
        Self {
            id: q.id,
            question_text: q.question_text,
            options,
            category: q.category,
        }
    }
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 1000), custom(function = not_blank))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500), custom(function = not_blank))]
    pub answer_a: String,
    #[validate(length(min = 1, max = 500), custom(function = not_blank))]
    pub answer_b: String,
    #[validate(length(min = 1, max = 500), custom(function = not_blank))]
    pub answer_c: String,
    #[validate(length(min = 1, max = 500), custom(function = not_blank))]
    pub answer_d: String,
    #[validate(length(min = 1, max = 500), custom(function = not_blank))]
    pub correct_answer: String,
    #[validate(length(min = 1, max = 50), custom(function = not_blank))]
    pub category: String,
}

impl QuestionRequest {
    /// Sanitizes every text field and attaches the given id.
    pub fn into_question(self, id: String) -> Question {
        Question {
            id,
            question_text: clean_html(&self.question_text),
            answer_a: clean_html(&self.answer_a),
            answer_b: clean_html(&self.answer_b),
            answer_c: clean_html(&self.answer_c),
            answer_d: clean_html(&self.answer_d),
            correct_answer: clean_html(&self.correct_answer),
            category: clean_html(&self.category),
        }
    }
}
