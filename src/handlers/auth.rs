// Token handlers
// JWT login and refresh endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use tracing::info;

use crate::auth::{verify_password, TOKEN_KIND_REFRESH};
use crate::error::ApiError;
use crate::models::user::LoginRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Obtain a token pair with email + password
/// POST /api/token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = request.email.trim().to_lowercase();

    let user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let pair = state.auth.issue_pair(user.id)?;

    info!("Issued token pair for user {}", user.id);
    Ok((StatusCode::OK, Json(pair)))
}

/// Exchange a refresh token for a fresh pair
/// POST /api/token/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.auth.decode(&request.refresh, TOKEN_KIND_REFRESH)?;

    // The account must still exist for the refresh to succeed
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(|_| ApiError::unauthorized("Account no longer exists"))?;

    let pair = state.auth.issue_pair(user.id)?;

    Ok((StatusCode::OK, Json(pair)))
}
