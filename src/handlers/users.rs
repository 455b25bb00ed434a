// Account handlers
// Registration, email verification, profile and download history

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::ApiError;
use crate::models::language::PREFERRED_LANGUAGES;
use crate::models::user::{
    ChangePasswordRequest, RegisterRequest, ResendVerificationRequest, UpdateProfileRequest, User,
    UserProfile,
};
use crate::state::AppState;

fn verification_link(state: &AppState, token: Uuid) -> String {
    format!(
        "{}/api/users/verify-email/{}",
        state.config.base_url.trim_end_matches('/'),
        token
    )
}

/// Register a new account
/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate().map_err(ApiError::Validation)?;

    let email = request.get_normalized_email();
    info!("Registering new account for email: {}", email);

    let password_hash = hash_password(&request.password)?;
    let user = User::new(
        email,
        request.get_normalized_username(),
        request.get_normalized_display_name(),
        password_hash,
        request.get_preferred_language(),
    );

    let user = state.db.create_user(&user).await?;

    if let Some(token) = user.verification_token {
        state
            .mailer
            .send_verification(&user.email, &user.username, &verification_link(&state, token))
            .await?;
    }

    let pair = state.auth.issue_pair(user.id)?;

    info!("Successfully registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "access": pair.access,
            "refresh": pair.refresh,
            "user": UserProfile::from(&user),
            "message": "We sent you an email to verify your account."
        })),
    ))
}

/// Confirm an email address with its one-time token
/// GET /api/users/verify-email/:token
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_verification_token(token)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired verification link"))?;

    state.db.mark_user_verified(user.id).await?;

    info!("Verified email for user {}", user.id);
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Email verified successfully." })),
    ))
}

/// Re-send the verification link for an unverified account
/// POST /api/users/resend-verification
///
/// Always answers 200 so the endpoint cannot be used to probe which emails
/// have accounts.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = request.email.trim().to_lowercase();

    if let Some(user) = state.db.get_user_by_email(&email).await? {
        if !user.is_verified {
            let token = Uuid::new_v4();
            state.db.set_verification_token(user.id, token).await?;
            state
                .mailer
                .send_verification(&user.email, &user.username, &verification_link(&state, token))
                .await?;
        }
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "If the address belongs to an unverified account, a new link is on its way."
        })),
    ))
}

/// Get the caller's profile
/// GET /api/users/me
pub async fn get_me(AuthUser(user): AuthUser) -> Result<impl IntoResponse, ApiError> {
    Ok((StatusCode::OK, Json(UserProfile::from(&user))))
}

/// Update the caller's profile
/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate().map_err(ApiError::Validation)?;

    let updated = state.db.update_user_profile(user.id, &request).await?;

    info!("Updated profile for user {}", user.id);
    Ok((StatusCode::OK, Json(UserProfile::from(&updated))))
}

/// Change the caller's password
/// PUT /api/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate().map_err(ApiError::Validation)?;

    if !verify_password(&request.current_password, &user.password_hash)? {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let password_hash = hash_password(&request.new_password)?;
    state.db.update_user_password(user.id, &password_hash).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Password updated successfully." })),
    ))
}

/// Delete the caller's account
/// DELETE /api/users/me
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let username = user.username.clone();
    state.db.delete_user(user.id).await?;

    info!("Deleted account '{}'", username);
    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's export history, newest first
/// GET /api/users/download-history
pub async fn download_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.db.list_downloads(user.id).await?;

    Ok((StatusCode::OK, Json(history)))
}

/// List the UI languages an account can choose
/// GET /api/users/languages
pub async fn preferred_languages() -> impl IntoResponse {
    let choices: Vec<_> = PREFERRED_LANGUAGES
        .iter()
        .map(|(code, label)| json!({ "code": code, "label": label }))
        .collect();

    (StatusCode::OK, Json(choices))
}
