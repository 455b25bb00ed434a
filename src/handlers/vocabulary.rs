// Vocabulary handlers
// Word registration (with the dedup generation pipeline) and entry CRUD

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::models::language::Language;
use crate::models::user::User;
use crate::models::user_word::{UpdateUserWordRequest, UserWord};
use crate::models::word::{CreateWordRequest, NewWordContent, WordContent};
use crate::auth::VerifiedUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListWordsQuery {
    pub deck: Option<String>,
}

/// Registers one word for a user: resolve the content cache, generate on a
/// miss, then link the user. Shared by the single-word endpoint and the CSV
/// bulk upload.
pub async fn register_word(
    state: &AppState,
    user: &User,
    request: &CreateWordRequest,
) -> Result<UserWord, ApiError> {
    request.validate().map_err(ApiError::Validation)?;

    let context = request.get_normalized_context();
    if context.is_some() && !user.is_premium {
        return Err(ApiError::validation(
            "Context-specific content requires a premium account",
        ));
    }

    let word = request.get_normalized_word();
    let source = state
        .db
        .get_language_by_code(&request.get_normalized_source_lang())
        .await?;
    let target = state
        .db
        .get_language_by_code(&request.get_normalized_target_lang())
        .await?;

    let image_url = request.get_normalized_image_url();
    let content = match context {
        Some(ref context) => {
            ensure_custom_content(state, &word, &source, &target, context, image_url).await?
        }
        None => ensure_shared_content(state, &word, &source, &target, image_url).await?,
    };

    let (shared_word_id, custom_content_id) = if content.is_custom() {
        (None, Some(content.id))
    } else {
        (Some(content.id), None)
    };

    match state
        .db
        .insert_user_word(user.id, shared_word_id, custom_content_id, &request.get_deck())
        .await
    {
        Ok(user_word) => Ok(user_word),
        Err(ApiError::Conflict(_)) => Err(ApiError::validation(
            "This word is already in your vocabulary",
        )),
        Err(e) => Err(e),
    }
}

/// Cache-or-generate for shared content. A losing race on the unique tuple
/// falls back to the row the winner inserted.
async fn ensure_shared_content(
    state: &AppState,
    word: &str,
    source: &Language,
    target: &Language,
    image_url: Option<String>,
) -> Result<WordContent, ApiError> {
    if let Some(content) = state
        .db
        .find_shared_content(word, source.id, target.id)
        .await?
    {
        info!("Reusing shared content {} for '{}'", content.id, word);
        return Ok(content);
    }

    let new_content = generate_content(state, word, source, target, None, image_url).await?;

    match state.db.insert_shared_content(&new_content).await {
        Ok(content) => Ok(content),
        Err(ApiError::Conflict(_)) => state
            .db
            .find_shared_content(word, source.id, target.id)
            .await?
            .ok_or_else(|| ApiError::conflict("Concurrent content creation failed")),
        Err(e) => Err(e),
    }
}

async fn ensure_custom_content(
    state: &AppState,
    word: &str,
    source: &Language,
    target: &Language,
    context: &str,
    image_url: Option<String>,
) -> Result<WordContent, ApiError> {
    if let Some(content) = state
        .db
        .find_custom_content(word, source.id, target.id, context)
        .await?
    {
        info!("Reusing custom content {} for '{}'", content.id, word);
        return Ok(content);
    }

    let new_content =
        generate_content(state, word, source, target, Some(context), image_url).await?;

    match state.db.insert_custom_content(&new_content).await {
        Ok(content) => Ok(content),
        Err(ApiError::Conflict(_)) => state
            .db
            .find_custom_content(word, source.id, target.id, context)
            .await?
            .ok_or_else(|| ApiError::conflict("Concurrent content creation failed")),
        Err(e) => Err(e),
    }
}

async fn generate_content(
    state: &AppState,
    word: &str,
    source: &Language,
    target: &Language,
    context: Option<&str>,
    image_url: Option<String>,
) -> Result<NewWordContent, ApiError> {
    let fields = state
        .pipeline
        .generate(word, source, target, context)
        .await?;

    Ok(NewWordContent {
        word: word.to_string(),
        source_lang_id: source.id,
        target_lang_id: target.id,
        context: context.map(str::to_string),
        translation: fields.translation,
        example_sentence: fields.example_sentence,
        example_translation: fields.example_translation,
        audio_word: fields.audio_word,
        audio_sentence: fields.audio_sentence,
        image_url,
    })
}

/// Register a word into the caller's vocabulary
/// POST /api/vocabulary
pub async fn create_word(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(request): Json<CreateWordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        "Registering word '{}' ({} -> {}) for user {}",
        request.word, request.source_lang, request.target_lang, user.id
    );

    let user_word = register_word(&state, &user, &request).await?;

    info!("Successfully registered vocabulary entry {}", user_word.id);
    Ok((StatusCode::CREATED, Json(user_word)))
}

/// List the caller's vocabulary, optionally filtered by deck
/// GET /api/vocabulary?deck=NAME
pub async fn list_words(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Query(query): Query<ListWordsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let words = state
        .db
        .list_user_words(user.id, query.deck.as_deref())
        .await?;

    info!("Retrieved {} vocabulary entries for user {}", words.len(), user.id);
    Ok((StatusCode::OK, Json(words)))
}

/// Get one vocabulary entry
/// GET /api/vocabulary/:id
pub async fn get_word(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let word = state.db.get_user_word(user.id, id).await?;

    Ok((StatusCode::OK, Json(word)))
}

/// Move a vocabulary entry to another deck
/// PATCH /api/vocabulary/:id
pub async fn update_word(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateUserWordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate().map_err(ApiError::Validation)?;

    let word = state
        .db
        .update_user_word_deck(user.id, id, &request.get_normalized_deck())
        .await?;

    info!("Moved vocabulary entry {} to deck '{}'", id, word.deck);
    Ok((StatusCode::OK, Json(word)))
}

/// Remove a vocabulary entry; the generated content stays cached
/// DELETE /api/vocabulary/:id
pub async fn delete_word(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_user_word(user.id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's deck labels
/// GET /api/vocabulary/decks
pub async fn list_decks(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
) -> Result<impl IntoResponse, ApiError> {
    let decks = state.db.list_decks(user.id).await?;

    Ok((StatusCode::OK, Json(decks)))
}
