// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{Question, QuestionRequest},
    services::{cleanup::run_cleanup, quiz::normalize_category},
    store::{DataStore, QUESTIONS},
};

/// Lists all questions in the bank.
/// Admin only.
pub async fn list_questions(
    State(store): State<Arc<dyn DataStore>>,
) -> Result<impl IntoResponse, AppError> {
    let docs = store
        .fetch_all(QUESTIONS)
        .await
        .map_err(|e| AppError::store("Failed to load questions", e))?;

    let questions: Vec<Question> = docs.iter().filter_map(Question::from_document).collect();

    Ok(Json(questions))
}

/// Fetches a single question by ID.
/// Admin only.
pub async fn get_question(
    State(store): State<Arc<dyn DataStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let question = store
        .get(QUESTIONS, &id)
        .await
        .map_err(|e| AppError::store("Error loading question", e))?
        .as_ref()
        .and_then(Question::from_document)
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Validates a question payload and resolves its category.
fn checked_question(payload: QuestionRequest, id: String) -> Result<Question, AppError> {
    payload.validate()?;

    let mut question = payload.into_question(id);
    question.category = normalize_category(&question.category)
        .ok_or_else(|| AppError::BadRequest("Invalid category".to_string()))?;

    if !question.options().contains(&question.correct_answer.as_str()) {
        return Err(AppError::BadRequest(
            "Correct answer must match one of the options".to_string(),
        ));
    }

    Ok(question)
}

/// Creates a new quiz question.
/// Admin only.
pub async fn create_question(
    State(store): State<Arc<dyn DataStore>>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = checked_question(payload, String::new())?;

    let id = store
        .add(QUESTIONS, question.to_data())
        .await
        .map_err(|e| AppError::store("Error saving question", e))?;

    tracing::info!("Created question {} in {}", id, question.category);

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Replaces a question by ID.
/// Admin only.
pub async fn update_question(
    State(store): State<Arc<dyn DataStore>>,
    Path(id): Path<String>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = checked_question(payload, id)?;

    // Check existence
    store
        .get(QUESTIONS, &question.id)
        .await
        .map_err(|e| AppError::store("Error loading question", e))?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    store
        .set(QUESTIONS, &question.id, question.to_data())
        .await
        .map_err(|e| AppError::store("Error saving question", e))?;

    Ok(Json(question))
}

/// Deletes a quiz question by ID.
/// Admin only.
pub async fn delete_question(
    State(store): State<Arc<dyn DataStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = store
        .delete(QUESTIONS, &id)
        .await
        .map_err(|e| AppError::store("Error deleting question", e))?;

    if !removed {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    tracing::info!("Deleted question {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Removes duplicate questions and invalid quiz results.
/// Admin only.
pub async fn cleanup(State(store): State<Arc<dyn DataStore>>) -> impl IntoResponse {
    let report = run_cleanup(store.as_ref()).await;
    Json(report)
}
