use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::profile::{CreateProfileRequest, ProfileName},
    AppState,
};

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProfileName>, ApiError> {
    state
        .profiles
        .find_name(id)
        .await
        .context("fetching profile")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found."))
}

pub async fn create_profile(
    State(state): State<AppState>,
    body: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let new_profile = body.validate()?;

    let profile = state
        .profiles
        .create(&new_profile)
        .await
        .context("saving profile")?;
    tracing::info!("Profile {} saved", profile.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Profile saved successfully!", "userId": profile.id })),
    ))
}
