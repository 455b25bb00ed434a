use tokio_postgres::Row;
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::ApiError;
use crate::models::language::Language;
use crate::models::user_word::UserWord;
use crate::models::word::{NewWordContent, WordContent};
use crate::pipeline::AudioKind;

// Column layout shared by every content SELECT:
//   0 id, 1 word, 2 translation, 3 example_sentence, 4 example_translation,
//   5 audio_word, 6 audio_sentence, 7 image_url, 8 context,
//   9-11 source language (id, code, name), 12-14 target language
const CONTENT_COLUMNS_SHARED: &str = "s.id, s.word, s.translation, s.example_sentence, \
     s.example_translation, s.audio_word, s.audio_sentence, s.image_url, NULL::TEXT, \
     sl.id, sl.code, sl.name, tl.id, tl.code, tl.name";

const CONTENT_COLUMNS_CUSTOM: &str = "c.id, c.word, c.translation, c.example_sentence, \
     c.example_translation, c.audio_word, c.audio_sentence, c.image_url, c.context, \
     sl.id, sl.code, sl.name, tl.id, tl.code, tl.name";

fn content_from_row(row: &Row, offset: usize) -> WordContent {
    WordContent {
        id: row.get(offset),
        word: row.get(offset + 1),
        translation: row.get(offset + 2),
        example_sentence: row.get(offset + 3),
        example_translation: row.get(offset + 4),
        audio_word: row.get(offset + 5),
        audio_sentence: row.get(offset + 6),
        image_url: row.get(offset + 7),
        context: row.get(offset + 8),
        source_lang: Language {
            id: row.get(offset + 9),
            code: row.get(offset + 10),
            name: row.get(offset + 11),
        },
        target_lang: Language {
            id: row.get(offset + 12),
            code: row.get(offset + 13),
            name: row.get(offset + 14),
        },
    }
}

// Join row layout for user words:
//   0 id, 1 deck, 2 shared_word_id, 3 custom_content_id, 4 created_at,
//   5.. resolved content in the layout above
const USER_WORD_QUERY: &str = r#"
    SELECT uw.id, uw.deck, uw.shared_word_id, uw.custom_content_id, uw.created_at,
           COALESCE(s.id, c.id), COALESCE(s.word, c.word),
           COALESCE(s.translation, c.translation),
           COALESCE(s.example_sentence, c.example_sentence),
           COALESCE(s.example_translation, c.example_translation),
           COALESCE(s.audio_word, c.audio_word),
           COALESCE(s.audio_sentence, c.audio_sentence),
           COALESCE(s.image_url, c.image_url),
           c.context,
           sl.id, sl.code, sl.name, tl.id, tl.code, tl.name
    FROM user_words uw
    LEFT JOIN shared_words s ON s.id = uw.shared_word_id
    LEFT JOIN custom_contents c ON c.id = uw.custom_content_id
    JOIN languages sl ON sl.id = COALESCE(s.source_lang_id, c.source_lang_id)
    JOIN languages tl ON tl.id = COALESCE(s.target_lang_id, c.target_lang_id)
"#;

fn user_word_from_row(row: &Row) -> UserWord {
    UserWord {
        id: row.get(0),
        deck: row.get(1),
        shared_word_id: row.get(2),
        custom_content_id: row.get(3),
        created_at: row.get(4),
        content: content_from_row(row, 5),
    }
}

// Language reference data

impl Database {
    pub async fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, code, name FROM languages ORDER BY code";

        let rows = client.query(query, &[]).await.map_err(ApiError::from)?;

        Ok(rows
            .iter()
            .map(|row| Language {
                id: row.get(0),
                code: row.get(1),
                name: row.get(2),
            })
            .collect())
    }

    pub async fn get_language_by_code(&self, code: &str) -> Result<Language, ApiError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, code, name FROM languages WHERE code = $1";

        let row = client
            .query_opt(query, &[&code])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(Language {
                id: row.get(0),
                code: row.get(1),
                name: row.get(2),
            }),
            None => Err(ApiError::Validation(format!(
                "Unknown language code '{}'",
                code
            ))),
        }
    }
}

// Generated content cache (shared + custom rows)

impl Database {
    /// 共有コンテンツのキャッシュ照会。タプルが既に生成済みなら再利用する。
    pub async fn find_shared_content(
        &self,
        word: &str,
        source_lang_id: i32,
        target_lang_id: i32,
    ) -> Result<Option<WordContent>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            r#"
            SELECT {}
            FROM shared_words s
            JOIN languages sl ON sl.id = s.source_lang_id
            JOIN languages tl ON tl.id = s.target_lang_id
            WHERE s.word = $1 AND s.source_lang_id = $2 AND s.target_lang_id = $3
            "#,
            CONTENT_COLUMNS_SHARED
        );

        let row = client
            .query_opt(&query, &[&word, &source_lang_id, &target_lang_id])
            .await
            .map_err(ApiError::from)?;

        Ok(row.as_ref().map(|row| content_from_row(row, 0)))
    }

    pub async fn find_custom_content(
        &self,
        word: &str,
        source_lang_id: i32,
        target_lang_id: i32,
        context: &str,
    ) -> Result<Option<WordContent>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            r#"
            SELECT {}
            FROM custom_contents c
            JOIN languages sl ON sl.id = c.source_lang_id
            JOIN languages tl ON tl.id = c.target_lang_id
            WHERE c.word = $1 AND c.source_lang_id = $2 AND c.target_lang_id = $3
              AND c.context = $4
            "#,
            CONTENT_COLUMNS_CUSTOM
        );

        let row = client
            .query_opt(&query, &[&word, &source_lang_id, &target_lang_id, &context])
            .await
            .map_err(ApiError::from)?;

        Ok(row.as_ref().map(|row| content_from_row(row, 0)))
    }

    pub async fn get_shared_content(&self, id: i32) -> Result<WordContent, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            r#"
            SELECT {}
            FROM shared_words s
            JOIN languages sl ON sl.id = s.source_lang_id
            JOIN languages tl ON tl.id = s.target_lang_id
            WHERE s.id = $1
            "#,
            CONTENT_COLUMNS_SHARED
        );

        let row = client
            .query_opt(&query, &[&id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(content_from_row(&row, 0)),
            None => Err(ApiError::NotFound(format!("Shared content with id {}", id))),
        }
    }

    pub async fn get_custom_content(&self, id: i32) -> Result<WordContent, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            r#"
            SELECT {}
            FROM custom_contents c
            JOIN languages sl ON sl.id = c.source_lang_id
            JOIN languages tl ON tl.id = c.target_lang_id
            WHERE c.id = $1
            "#,
            CONTENT_COLUMNS_CUSTOM
        );

        let row = client
            .query_opt(&query, &[&id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(content_from_row(&row, 0)),
            None => Err(ApiError::NotFound(format!("Custom content with id {}", id))),
        }
    }

    /// 生成結果を共有行として保存する。内容フィールドはこの INSERT の一度きり。
    pub async fn insert_shared_content(
        &self,
        content: &NewWordContent,
    ) -> Result<WordContent, ApiError> {
        let client = self.get_connection().await?;
        let query = r#"
            INSERT INTO shared_words (word, source_lang_id, target_lang_id, translation,
                                      example_sentence, example_translation, audio_word,
                                      audio_sentence, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
        "#;

        let row = client
            .query_one(
                query,
                &[
                    &content.word,
                    &content.source_lang_id,
                    &content.target_lang_id,
                    &content.translation,
                    &content.example_sentence,
                    &content.example_translation,
                    &content.audio_word,
                    &content.audio_sentence,
                    &content.image_url,
                ],
            )
            .await
            .map_err(ApiError::from)?;

        let id: i32 = row.get(0);
        info!("Created shared content {} for word '{}'", id, content.word);
        self.get_shared_content(id).await
    }

    pub async fn insert_custom_content(
        &self,
        content: &NewWordContent,
    ) -> Result<WordContent, ApiError> {
        let context = content.context.as_deref().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("Custom content requires a context"))
        })?;

        let client = self.get_connection().await?;
        let query = r#"
            INSERT INTO custom_contents (word, source_lang_id, target_lang_id, context,
                                         translation, example_sentence, example_translation,
                                         audio_word, audio_sentence, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
        "#;

        let row = client
            .query_one(
                query,
                &[
                    &content.word,
                    &content.source_lang_id,
                    &content.target_lang_id,
                    &context,
                    &content.translation,
                    &content.example_sentence,
                    &content.example_translation,
                    &content.audio_word,
                    &content.audio_sentence,
                    &content.image_url,
                ],
            )
            .await
            .map_err(ApiError::from)?;

        let id: i32 = row.get(0);
        info!("Created custom content {} for word '{}'", id, content.word);
        self.get_custom_content(id).await
    }

    /// 生成時に失敗した音声を後から埋める。既存の値は上書きしない運用。
    pub async fn update_content_audio(
        &self,
        is_custom: bool,
        content_id: i32,
        kind: AudioKind,
        file_name: &str,
    ) -> Result<(), ApiError> {
        let table = if is_custom { "custom_contents" } else { "shared_words" };
        let column = match kind {
            AudioKind::Word => "audio_word",
            AudioKind::Sentence => "audio_sentence",
        };

        let client = self.get_connection().await?;
        let query = format!("UPDATE {} SET {} = $2 WHERE id = $1", table, column);

        let rows_affected = client
            .execute(&query, &[&content_id, &file_name])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            return Err(ApiError::NotFound(format!(
                "Content row with id {}",
                content_id
            )));
        }

        info!("Stored {} audio for {} row {}", kind.as_str(), table, content_id);
        Ok(())
    }
}

// User vocabulary operations

impl Database {
    pub async fn insert_user_word(
        &self,
        user_id: Uuid,
        shared_word_id: Option<i32>,
        custom_content_id: Option<i32>,
        deck: &str,
    ) -> Result<UserWord, ApiError> {
        let client = self.get_connection().await?;
        let query = r#"
            INSERT INTO user_words (user_id, shared_word_id, custom_content_id, deck)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#;

        let row = client
            .query_one(query, &[&user_id, &shared_word_id, &custom_content_id, &deck])
            .await
            .map_err(ApiError::from)?;

        let id: i32 = row.get(0);
        info!("Linked user {} to content as entry {}", user_id, id);
        self.get_user_word(user_id, id).await
    }

    /// デッキで絞り込むかどうかを `Option<&str>` で表現している。
    pub async fn list_user_words(
        &self,
        user_id: Uuid,
        deck: Option<&str>,
    ) -> Result<Vec<UserWord>, ApiError> {
        let client = self.get_connection().await?;

        let rows = if let Some(deck) = deck {
            let query = format!(
                "{} WHERE uw.user_id = $1 AND uw.deck = $2 ORDER BY uw.created_at DESC",
                USER_WORD_QUERY
            );
            client
                .query(&query, &[&user_id, &deck])
                .await
                .map_err(ApiError::from)?
        } else {
            let query = format!(
                "{} WHERE uw.user_id = $1 ORDER BY uw.created_at DESC",
                USER_WORD_QUERY
            );
            client
                .query(&query, &[&user_id])
                .await
                .map_err(ApiError::from)?
        };

        Ok(rows.iter().map(user_word_from_row).collect())
    }

    pub async fn get_user_word(&self, user_id: Uuid, id: i32) -> Result<UserWord, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("{} WHERE uw.user_id = $1 AND uw.id = $2", USER_WORD_QUERY);

        let row = client
            .query_opt(&query, &[&user_id, &id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(user_word_from_row(&row)),
            None => Err(ApiError::NotFound(format!("Vocabulary entry with id {}", id))),
        }
    }

    pub async fn get_user_words_by_ids(
        &self,
        user_id: Uuid,
        ids: &[i32],
    ) -> Result<Vec<UserWord>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "{} WHERE uw.user_id = $1 AND uw.id = ANY($2) ORDER BY uw.created_at DESC",
            USER_WORD_QUERY
        );

        let ids_vec: Vec<i32> = ids.to_vec();
        let rows = client
            .query(&query, &[&user_id, &ids_vec])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(user_word_from_row).collect())
    }

    pub async fn list_decks(&self, user_id: Uuid) -> Result<Vec<String>, ApiError> {
        let client = self.get_connection().await?;
        let query = "SELECT DISTINCT deck FROM user_words WHERE user_id = $1 ORDER BY deck";

        let rows = client
            .query(query, &[&user_id])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    pub async fn update_user_word_deck(
        &self,
        user_id: Uuid,
        id: i32,
        deck: &str,
    ) -> Result<UserWord, ApiError> {
        let client = self.get_connection().await?;
        let query = "UPDATE user_words SET deck = $3 WHERE user_id = $1 AND id = $2";

        let rows_affected = client
            .execute(query, &[&user_id, &id, &deck])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            return Err(ApiError::NotFound(format!("Vocabulary entry with id {}", id)));
        }

        self.get_user_word(user_id, id).await
    }

    /// ユーザーの語彙からエントリを外すだけで、共有コンテンツ行は残す。
    pub async fn delete_user_word(&self, user_id: Uuid, id: i32) -> Result<(), ApiError> {
        let client = self.get_connection().await?;
        let query = "DELETE FROM user_words WHERE user_id = $1 AND id = $2";

        let rows_affected = client
            .execute(query, &[&user_id, &id])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            Err(ApiError::NotFound(format!("Vocabulary entry with id {}", id)))
        } else {
            info!("Removed vocabulary entry {} for user {}", id, user_id);
            Ok(())
        }
    }
}
