use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::notification::{NotifyCaregiverRequest, NotifyOutcome},
    AppState,
};

/// POST /api/notify-caregiver — manual trigger for the missed-dose text.
pub async fn notify_caregiver(
    State(state): State<AppState>,
    body: Result<Json<NotifyCaregiverRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (user_id, medicine_name) = body.validate()?;

    let message = match state.notifications.notify(user_id, &medicine_name).await? {
        NotifyOutcome::Sent { .. } => "Caregiver notification sent successfully.",
        NotifyOutcome::Skipped => "No primary caregiver on file; notification skipped.",
    };
    Ok(Json(json!({ "message": message })))
}
