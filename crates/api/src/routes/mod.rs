//! HTTP routes

pub mod login;
pub mod meeting;
pub mod pages;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

/// Build the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/login", post(login::login))
        .route("/api/zoom-signature", post(meeting::zoom_signature))
        .route("/api/save-page", post(pages::save_page))
        .route("/api/load-page", post(pages::load_page))
        .with_state(state)
}

/// Origin-locked, POST-only CORS policy
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    tracing::info!(
        allowed_origins = ?origins,
        "CORS configured with {} allowed origins",
        origins.len()
    );

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Liveness probe; does not touch the store
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
