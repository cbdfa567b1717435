// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    config::LEADERBOARD_SIZE, error::AppError, services::leaderboard::build_leaderboard,
    store::DataStore,
};

/// Retrieves the top 10 players by total score across all attempts.
pub async fn get_leaderboard(
    State(store): State<Arc<dyn DataStore>>,
) -> Result<impl IntoResponse, AppError> {
    let leaderboard = build_leaderboard(store.as_ref(), LEADERBOARD_SIZE)
        .await
        .map_err(|e| AppError::store("Error loading leaderboard", e))?;

    Ok(Json(leaderboard))
}
