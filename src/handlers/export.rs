// Export handlers
// Anki package building, reuse by content hash, download history

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::anki::{build_package, content_hash, package_file_name, DeckCard};
use crate::auth::VerifiedUser;
use crate::error::ApiError;
use crate::media::AUDIO_DIR;
use crate::models::user_word::UserWord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub ids: Option<Vec<i32>>,
    pub deck: Option<String>,
}

fn deck_card(word: &UserWord) -> DeckCard {
    let content = &word.content;
    DeckCard {
        word: content.word.clone(),
        translation: content.translation.clone().unwrap_or_default(),
        example: content.example_sentence.clone().unwrap_or_default(),
        example_translation: content.example_translation.clone().unwrap_or_default(),
        word_audio: content.audio_word.clone(),
        sentence_audio: content.audio_sentence.clone(),
        image_url: content.image_url.clone(),
    }
}

/// Export a selection of the caller's words as an `.apkg` attachment
/// POST /api/anki/export
///
/// Selection precedence: explicit ids, then deck name, then the whole
/// vocabulary. A package whose content hash was already built is reused
/// instead of rebuilt; either way the download lands in the history.
pub async fn export_deck(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let words = match (&request.ids, &request.deck) {
        (Some(ids), _) if !ids.is_empty() => state.db.get_user_words_by_ids(user.id, ids).await?,
        (_, Some(deck)) => state.db.list_user_words(user.id, Some(deck)).await?,
        _ => state.db.list_user_words(user.id, None).await?,
    };

    if words.is_empty() {
        return Err(ApiError::validation("No words found to export"));
    }

    let deck_name = request
        .deck
        .clone()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| words[0].deck.clone());

    let keys: Vec<String> = words.iter().map(UserWord::content_key).collect();
    let hash = content_hash(&keys);
    let file_name = package_file_name(&deck_name, &hash);

    let export_dir = state.media.ensure_export_dir(user.id).await?;
    let output_path = export_dir.join(&file_name);

    if output_path.exists() {
        info!(
            "Reusing existing package {} for user {}",
            file_name, user.id
        );
    } else {
        let cards: Vec<DeckCard> = words.iter().map(deck_card).collect();
        let audio_dir = state.media.root().join(AUDIO_DIR);
        let owner = user.username.clone();
        let deck_name_for_build = deck_name.clone();
        let output_for_build = output_path.clone();

        // Package building is sqlite + zip work, keep it off the async reactor
        tokio::task::spawn_blocking(move || {
            build_package(
                &deck_name_for_build,
                &owner,
                &cards,
                &audio_dir,
                &output_for_build,
            )
        })
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Package build task failed: {}", e)))??;
    }

    let word_ids = words
        .iter()
        .map(|w| w.id.to_string())
        .collect::<Vec<_>>()
        .join(",");

    state
        .db
        .record_download(
            user.id,
            &deck_name,
            &word_ids,
            &output_path.to_string_lossy(),
        )
        .await?;

    let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
        ApiError::Internal(anyhow::anyhow!(
            "Failed to read package {}: {}",
            output_path.display(),
            e
        ))
    })?;

    info!(
        "Exported {} words as {} for user {}",
        words.len(),
        file_name,
        user.id
    );

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}
