use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of the caregiver notification path.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("caregiver lookup failed: {0}")]
    Lookup(#[source] anyhow::Error),

    #[error("messaging channel is not configured")]
    NotConfigured,

    #[error("messaging channel failed: {0}")]
    Channel(String),
}

/// Errors surfaced by HTTP handlers. Only the variant's public message reaches the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Validation(m) | Self::NotFound(m) => m.clone(),
            Self::Store(e) => {
                tracing::error!("Store failure: {e:#}");
                "Internal server error.".to_string()
            }
            Self::Dispatch(e) => {
                tracing::error!("Notification dispatch failure: {e}");
                "Failed to send caregiver notification.".to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
