use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::Value;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{UpdateProfileRequest, UserProfile},
    store::{DataStore, Document, USERS, to_object},
    utils::jwt::Claims,
};

fn decode_profile(doc: Document) -> Result<UserProfile, AppError> {
    let mut profile: UserProfile = serde_json::from_value(Value::Object(doc.data))
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    profile.id = doc.id;
    Ok(profile)
}

/// Get current user's profile.
pub async fn get_me(
    State(store): State<Arc<dyn DataStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let doc = store
        .get(USERS, &claims.sub)
        .await
        .map_err(|e| AppError::store("Error loading profile", e))?
        .ok_or(AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(decode_profile(doc)?))
}

/// Creates or updates the current user's profile.
/// Only the fields present in the request are changed.
pub async fn update_me(
    State(store): State<Arc<dyn DataStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload
        .check_formats()
        .map_err(|field| AppError::BadRequest(format!("Invalid {}", field)))?;

    let existing = store
        .get(USERS, &claims.sub)
        .await
        .map_err(|e| AppError::store("Error loading profile", e))?;

    let mut profile = match existing {
        Some(doc) => decode_profile(doc)?,
        None => UserProfile::default(),
    };
    profile.id = claims.sub.clone();
    profile.registered_user = true;
    payload.apply(&mut profile);

    store
        .set(USERS, &claims.sub, to_object(&profile)?)
        .await
        .map_err(|e| AppError::store("Error updating profile", e))?;

    tracing::info!("Updated profile for {}", claims.sub);

    Ok(Json(profile))
}
