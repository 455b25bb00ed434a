// Handlers module
// HTTP handlers for the REST API

pub mod audio;
pub mod auth;
pub mod bulk;
pub mod export;
pub mod languages;
pub mod users;
pub mod vocabulary;

use axum::{http::StatusCode, response::IntoResponse};

/// Health check handler
/// Returns "OK" with 200 status for monitoring purposes
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
