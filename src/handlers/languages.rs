// Language handlers
// Reference data for vocabulary language pairs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::error::ApiError;
use crate::state::AppState;

/// List all seeded languages
/// GET /api/languages
pub async fn list_languages(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let languages = state.db.list_languages().await?;

    Ok((StatusCode::OK, Json(languages)))
}
