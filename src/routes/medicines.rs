use anyhow::Context;
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::medicine::{MedicineForm, MedicineSummary, UpdateMedicineStatusRequest},
    services::uploads,
    AppState,
};

/// POST /api/medicines — multipart form with an optional `photo` file.
pub async fn create_medicine(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::validation(format!("Invalid form: {}", e.body_text())))?;

    let mut form = MedicineForm::default();
    let mut photo: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid form: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "photo" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid photo: {}", e.body_text())))?;
            if !bytes.is_empty() {
                photo = Some(bytes);
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid field {name}: {}", e.body_text())))?;
            form.set(&name, value);
        }
    }

    let mut new_medicine = form.validate()?;

    let stored = match &photo {
        Some(bytes) => Some(uploads::save_photo(&state.config.upload_dir, bytes).await?),
        None => None,
    };
    new_medicine.photo_url = stored.as_ref().map(|p| p.url.clone());

    let medicine = match state.medicines.create(&new_medicine).await {
        Ok(m) => m,
        Err(e) => {
            if let Some(photo) = &stored {
                uploads::discard_photo(photo).await;
            }
            return Err(ApiError::Store(e.context("saving medicine")));
        }
    };
    tracing::info!("Medicine {} saved for user {}", medicine.id, medicine.user_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Medicine saved successfully!", "medicineId": medicine.id })),
    ))
}

pub async fn list_medicines(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<MedicineSummary>>, ApiError> {
    let medicines = state
        .medicines
        .list_for_user(user_id)
        .await
        .context("fetching medicines")?;
    Ok(Json(medicines))
}

pub async fn update_medicine_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateMedicineStatusRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let is_taken = body.validate()?;

    let updated = state
        .medicines
        .set_taken(id, is_taken)
        .await
        .context("updating medicine status")?;
    if !updated {
        return Err(ApiError::not_found("Medicine not found."));
    }
    tracing::info!("Medicine {} marked is_taken={}", id, is_taken);

    Ok(Json(json!({ "message": "Medicine status updated successfully." })))
}
