// Audio handlers
// Fills in missing TTS audio for an existing vocabulary entry

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::VerifiedUser;
use crate::error::ApiError;
use crate::pipeline::{audio_file_name, AudioKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateAudioRequest {
    pub user_word_id: i32,
    pub kind: String,
}

impl GenerateAudioRequest {
    fn audio_kind(&self) -> Result<AudioKind, ApiError> {
        match self.kind.as_str() {
            "word" => Ok(AudioKind::Word),
            "sentence" => Ok(AudioKind::Sentence),
            other => Err(ApiError::Validation(format!(
                "Unknown audio kind '{}', expected 'word' or 'sentence'",
                other
            ))),
        }
    }
}

/// Generate missing audio for a vocabulary entry
/// POST /api/generate-audio
///
/// Existing audio is returned as-is; content rows are only ever completed,
/// never regenerated.
pub async fn generate_audio(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(request): Json<GenerateAudioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = request.audio_kind()?;

    let user_word = state.db.get_user_word(user.id, request.user_word_id).await?;
    let content = &user_word.content;

    let existing = match kind {
        AudioKind::Word => content.audio_word.as_ref(),
        AudioKind::Sentence => content.audio_sentence.as_ref(),
    };

    if let Some(file_name) = existing {
        return Ok((
            StatusCode::OK,
            Json(json!({
                "file_name": file_name,
                "created": false,
                "message": "Audio already exists."
            })),
        ));
    }

    let text = match kind {
        AudioKind::Word => content.word.clone(),
        AudioKind::Sentence => content.example_sentence.clone().ok_or_else(|| {
            ApiError::validation("The entry has no example sentence to synthesize")
        })?,
    };

    let file_name = audio_file_name(
        &content.word,
        &content.source_lang,
        &content.target_lang,
        content.context.as_deref(),
        kind,
    );

    let stored = state
        .pipeline
        .synthesize_to_media(&text, &content.source_lang.code, &file_name)
        .await?;

    state
        .db
        .update_content_audio(content.is_custom(), content.id, kind, &stored)
        .await?;

    info!(
        "Generated {} audio for vocabulary entry {} ({})",
        kind.as_str(),
        user_word.id,
        stored
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "file_name": stored,
            "created": true,
            "message": "Audio generated successfully."
        })),
    ))
}
