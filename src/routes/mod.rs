pub mod caregivers;
pub mod health;
pub mod medicines;
pub mod metrics;
pub mod notify;
pub mod profile;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    // Mobile clients call from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]))
        .allow_origin(Any);

    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::liveness))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Profiles
        .route("/api/profile", post(profile::create_profile))
        .route("/api/profile/{id}", get(profile::get_profile))
        // Medicines: GET takes a user id, PUT a medicine id
        .route("/api/medicines", post(medicines::create_medicine))
        .route(
            "/api/medicines/{id}",
            get(medicines::list_medicines).put(medicines::update_medicine_status),
        )
        .route("/api/notify-caregiver", post(notify::notify_caregiver))
        // Caregivers: GET takes a user id, PUT/DELETE a caregiver id
        .route("/api/caregivers", post(caregivers::create_caregiver))
        .route(
            "/api/caregivers/{id}",
            get(caregivers::list_caregivers)
                .put(caregivers::update_caregiver)
                .delete(caregivers::delete_caregiver),
        )
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
