// src/handlers/quiz.rs

use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::{CATEGORIES, CATEGORY_TOP_SCORES, MAX_SESSION_QUESTIONS},
    error::AppError,
    models::{
        attempt::{Attempt, CategoryScore, SubmitQuizRequest, SubmitQuizResponse},
        question::{PublicQuestion, Question},
    },
    services::quiz::{draw_session, grade, normalize_category},
    store::{DataStore, Direction, OrderedQuery, QUESTIONS, QUIZ_RESULTS},
    utils::jwt::Claims,
};

fn category_from_path(raw: &str) -> Result<String, AppError> {
    normalize_category(raw).ok_or_else(|| AppError::BadRequest("Invalid category".to_string()))
}

/// Lists the quiz categories players can pick from.
pub async fn list_categories() -> impl IntoResponse {
    Json(CATEGORIES)
}

/// Draws a quiz session for a category.
///
/// Returns up to 20 shuffled questions without their correct answers.
pub async fn generate_session(
    State(store): State<Arc<dyn DataStore>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let category = category_from_path(&category)?;

    let docs = store
        .fetch_by_field(QUESTIONS, "category", &category.clone().into())
        .await
        .map_err(|e| AppError::store("Error loading questions", e))?;

    let questions: Vec<Question> = docs.iter().filter_map(Question::from_document).collect();
    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions available for this category".to_string(),
        ));
    }

    let session = draw_session(questions, &mut rand::thread_rng());
    tracing::debug!("Drew {} questions for category {}", session.len(), category);

    let public: Vec<PublicQuestion> = session.into_iter().map(PublicQuestion::from).collect();
    Ok(Json(public))
}

/// Grades a finished quiz and records the attempt.
///
/// * Every submitted answer counts towards `totalQuestions`.
/// * One point per answer matching the stored correct answer.
pub async fn submit_quiz(
    State(store): State<Arc<dyn DataStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let category = category_from_path(&req.category)?;

    if req.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }
    if req.answers.len() > MAX_SESSION_QUESTIONS {
        return Err(AppError::BadRequest(format!(
            "A quiz holds at most {} questions",
            MAX_SESSION_QUESTIONS
        )));
    }

    let docs = store
        .fetch_by_field(QUESTIONS, "category", &category.clone().into())
        .await
        .map_err(|e| AppError::store("Error grading quiz", e))?;

    let answer_key: HashMap<String, Question> = docs
        .iter()
        .filter_map(Question::from_document)
        .map(|q| (q.id.clone(), q))
        .collect();

    let grade = grade(&req.answers, &answer_key);

    let attempt = Attempt {
        id: String::new(),
        user_id: claims.sub,
        category: category.clone(),
        score: grade.correct as i64,
        total_questions: grade.total as i64,
        timestamp: Utc::now(),
    };

    let result_id = store
        .add(QUIZ_RESULTS, attempt.to_data())
        .await
        .map_err(|e| AppError::store("Error saving results", e))?;

    tracing::info!(
        "User {} scored {}/{} in {}",
        attempt.user_id,
        grade.correct,
        grade.total,
        category
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitQuizResponse {
            result_id,
            category,
            score: attempt.score,
            correct_count: grade.correct,
            incorrect_count: grade.incorrect(),
            total_questions: grade.total,
        }),
    ))
}

/// Lists the caller's attempts, newest first.
pub async fn get_history(
    State(store): State<Arc<dyn DataStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let query =
        OrderedQuery::new("timestamp", Direction::Descending).filter("userId", claims.sub.as_str());

    let docs = store
        .fetch_ordered(QUIZ_RESULTS, &query)
        .await
        .map_err(|e| AppError::store("Error loading quiz history", e))?;

    let history: Vec<Attempt> = docs.iter().filter_map(Attempt::from_document).collect();
    tracing::debug!("Loaded {} history entries for {}", history.len(), claims.sub);

    Ok(Json(history))
}

/// Retrieves the top 3 scores recorded in a category.
pub async fn get_top_scores(
    State(store): State<Arc<dyn DataStore>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let category = category_from_path(&category)?;

    let query = OrderedQuery::new("score", Direction::Descending)
        .filter("category", category.as_str())
        .limit(CATEGORY_TOP_SCORES);

    let docs = store
        .fetch_ordered(QUIZ_RESULTS, &query)
        .await
        .map_err(|e| AppError::store("Error loading top scores", e))?;

    let scores: Vec<CategoryScore> = docs
        .iter()
        .filter_map(Attempt::from_document)
        .map(CategoryScore::from)
        .collect();

    Ok(Json(scores))
}
