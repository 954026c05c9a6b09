use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::caregiver::{CaregiverPatch, CaregiverSummary, CreateCaregiverRequest},
    AppState,
};

pub async fn list_caregivers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<CaregiverSummary>>, ApiError> {
    let caregivers = state
        .caregivers
        .list_for_user(user_id)
        .await
        .context("fetching caregivers")?;
    Ok(Json(caregivers))
}

pub async fn create_caregiver(
    State(state): State<AppState>,
    body: Result<Json<CreateCaregiverRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let new_caregiver = body.validate()?;

    let caregiver = state
        .caregivers
        .create(&new_caregiver)
        .await
        .context("adding caregiver")?;
    tracing::info!("Caregiver {} added for user {}", caregiver.id, caregiver.user_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Caregiver added successfully!", "caregiverId": caregiver.id })),
    ))
}

pub async fn update_caregiver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<CaregiverPatch>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let patch = match body {
        Ok(Json(patch)) => patch.validate()?,
        // A bodiless request is an empty patch.
        Err(JsonRejection::MissingJsonContentType(_)) => CaregiverPatch::default().validate()?,
        Err(rejection) => return Err(rejection.into()),
    };

    let updated = state
        .caregivers
        .update(id, &patch)
        .await
        .context("updating caregiver")?;
    if !updated {
        return Err(ApiError::not_found("Caregiver not found."));
    }
    tracing::info!("Caregiver {} updated", id);

    Ok(Json(json!({ "message": "Caregiver updated successfully." })))
}

pub async fn delete_caregiver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .caregivers
        .delete(id)
        .await
        .context("deleting caregiver")?;
    if !deleted {
        return Err(ApiError::not_found("Caregiver not found."));
    }
    tracing::info!("Caregiver {} deleted", id);

    Ok(Json(json!({ "message": "Caregiver deleted successfully." })))
}
