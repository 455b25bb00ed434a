use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::word::WordContent;

/// One entry of a user's vocabulary: the join row plus its resolved content.
/// Exactly one of `shared_word_id` / `custom_content_id` is set, mirroring
/// the database check constraint.
#[derive(Debug, Clone, Serialize)]
pub struct UserWord {
    pub id: i32,
    pub deck: String,
    pub shared_word_id: Option<i32>,
    pub custom_content_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub content: WordContent,
}

impl UserWord {
    /// Identifier of the backing content row, for export set hashing.
    pub fn content_key(&self) -> String {
        match (self.custom_content_id, self.shared_word_id) {
            (Some(custom), _) => format!("c{}", custom),
            (None, Some(shared)) => format!("s{}", shared),
            (None, None) => String::new(),
        }
    }
}

/// Request structure for re-labelling an entry; only the deck is mutable.
#[derive(Debug, Deserialize)]
pub struct UpdateUserWordRequest {
    pub deck: String,
}

impl UpdateUserWordRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.deck.trim().is_empty() {
            return Err("Deck name cannot be empty".to_string());
        }

        if self.deck.trim().len() > 100 {
            return Err("Deck name cannot exceed 100 characters".to_string());
        }

        Ok(())
    }

    pub fn get_normalized_deck(&self) -> String {
        self.deck.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::language::Language;

    fn user_word(shared: Option<i32>, custom: Option<i32>) -> UserWord {
        UserWord {
            id: 1,
            deck: "animals".to_string(),
            shared_word_id: shared,
            custom_content_id: custom,
            created_at: Utc::now(),
            content: WordContent {
                id: shared.or(custom).unwrap_or(0),
                word: "mariposa".to_string(),
                source_lang: Language {
                    id: 1,
                    code: "es".to_string(),
                    name: "Spanish".to_string(),
                },
                target_lang: Language {
                    id: 2,
                    code: "en".to_string(),
                    name: "English".to_string(),
                },
                context: custom.map(|_| "insects".to_string()),
                translation: Some("butterfly".to_string()),
                example_sentence: None,
                example_translation: None,
                audio_word: None,
                audio_sentence: None,
                image_url: None,
            },
        }
    }

    #[test]
    fn test_content_key_prefers_custom_content() {
        assert_eq!(user_word(Some(4), None).content_key(), "s4");
        assert_eq!(user_word(None, Some(9)).content_key(), "c9");
    }

    #[test]
    fn test_update_user_word_request_validation() {
        let valid = UpdateUserWordRequest {
            deck: " travel ".to_string(),
        };
        assert!(valid.validate().is_ok());
        assert_eq!(valid.get_normalized_deck(), "travel");

        let empty = UpdateUserWordRequest {
            deck: "  ".to_string(),
        };
        assert!(empty.validate().is_err());

        let long = UpdateUserWordRequest {
            deck: "d".repeat(101),
        };
        assert!(long.validate().is_err());
    }
}
