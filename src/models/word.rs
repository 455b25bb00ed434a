use serde::{Deserialize, Serialize};

use crate::models::language::Language;

/// Generated flashcard content for one `(word, source, target[, context])`
/// tuple, resolved together with its language rows.
///
/// Shared rows carry `context: None`; custom (premium) rows always carry a
/// non-empty context. Content fields are written once, when the tuple is
/// first generated, and reused as-is afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordContent {
    pub id: i32,
    pub word: String,
    pub source_lang: Language,
    pub target_lang: Language,
    pub context: Option<String>,
    pub translation: Option<String>,
    pub example_sentence: Option<String>,
    pub example_translation: Option<String>,
    pub audio_word: Option<String>,
    pub audio_sentence: Option<String>,
    pub image_url: Option<String>,
}

impl WordContent {
    pub fn is_custom(&self) -> bool {
        self.context.is_some()
    }
}

/// Freshly generated field values, ready to be inserted as a content row.
#[derive(Debug, Clone)]
pub struct NewWordContent {
    pub word: String,
    pub source_lang_id: i32,
    pub target_lang_id: i32,
    pub context: Option<String>,
    pub translation: String,
    pub example_sentence: String,
    pub example_translation: String,
    pub audio_word: Option<String>,
    pub audio_sentence: Option<String>,
    pub image_url: Option<String>,
}

/// Request structure for registering a word into the caller's vocabulary
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWordRequest {
    pub word: String,
    pub source_lang: String,
    pub target_lang: String,
    pub context: Option<String>,
    pub deck: Option<String>,
    pub image_url: Option<String>,
}

impl CreateWordRequest {
    /// Validate the create word request
    pub fn validate(&self) -> Result<(), String> {
        // Validate word (required)
        if self.word.trim().is_empty() {
            return Err("Word cannot be empty".to_string());
        }

        if self.word.trim().len() > 100 {
            return Err("Word cannot exceed 100 characters".to_string());
        }

        // Validate language codes (required)
        if self.source_lang.trim().is_empty() {
            return Err("Source language cannot be empty".to_string());
        }

        if self.target_lang.trim().is_empty() {
            return Err("Target language cannot be empty".to_string());
        }

        if self.source_lang.trim() == self.target_lang.trim() {
            return Err("Source and target language must differ".to_string());
        }

        // Validate context if provided (optional, premium)
        if let Some(ref context) = self.context {
            if context.trim().len() > 500 {
                return Err("Context cannot exceed 500 characters".to_string());
            }
        }

        // Validate deck if provided (optional)
        if let Some(ref deck) = self.deck {
            if deck.trim().len() > 100 {
                return Err("Deck name cannot exceed 100 characters".to_string());
            }
        }

        if let Some(ref image_url) = self.image_url {
            if image_url.len() > 500 {
                return Err("Image URL cannot exceed 500 characters".to_string());
            }
        }

        Ok(())
    }

    /// Dedup keys are matched on the canonical form: trimmed and lowercased.
    pub fn get_normalized_word(&self) -> String {
        self.word.trim().to_lowercase()
    }

    pub fn get_normalized_source_lang(&self) -> String {
        self.source_lang.trim().to_string()
    }

    pub fn get_normalized_target_lang(&self) -> String {
        self.target_lang.trim().to_string()
    }

    /// Get normalized context (trimmed, None if empty)
    pub fn get_normalized_context(&self) -> Option<String> {
        self.context
            .as_ref()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    /// Get the deck label, falling back to the default deck
    pub fn get_deck(&self) -> String {
        self.deck
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn get_normalized_image_url(&self) -> Option<String> {
        self.image_url
            .as_ref()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateWordRequest {
        CreateWordRequest {
            word: "Mariposa".to_string(),
            source_lang: "es".to_string(),
            target_lang: "en".to_string(),
            context: None,
            deck: None,
            image_url: None,
        }
    }

    #[test]
    fn test_create_word_request_validation() {
        assert!(request().validate().is_ok());

        let mut empty_word = request();
        empty_word.word = "   ".to_string();
        assert!(empty_word.validate().is_err());

        let mut long_word = request();
        long_word.word = "a".repeat(101);
        assert!(long_word.validate().is_err());

        let mut same_langs = request();
        same_langs.target_lang = "es".to_string();
        assert!(same_langs.validate().is_err());

        let mut long_context = request();
        long_context.context = Some("c".repeat(501));
        assert!(long_context.validate().is_err());

        let mut long_deck = request();
        long_deck.deck = Some("d".repeat(101));
        assert!(long_deck.validate().is_err());
    }

    #[test]
    fn test_create_word_request_normalization() {
        let request = CreateWordRequest {
            word: "  Mariposa  ".to_string(),
            source_lang: " es ".to_string(),
            target_lang: " en ".to_string(),
            context: Some("   ".to_string()),
            deck: Some("  ".to_string()),
            image_url: None,
        };

        assert_eq!(request.get_normalized_word(), "mariposa");
        assert_eq!(request.get_normalized_source_lang(), "es");
        assert_eq!(request.get_normalized_target_lang(), "en");
        assert_eq!(request.get_normalized_context(), None);
        assert_eq!(request.get_deck(), "default");
    }

    #[test]
    fn test_context_is_preserved_when_present() {
        let mut with_context = request();
        with_context.context = Some(" for a biology class ".to_string());
        assert_eq!(
            with_context.get_normalized_context(),
            Some("for a biology class".to_string())
        );
    }

    #[test]
    fn test_word_content_serialization() {
        let content = WordContent {
            id: 7,
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
            context: None,
            translation: Some("butterfly".to_string()),
            example_sentence: Some("La mariposa vuela sobre las flores.".to_string()),
            example_translation: Some("The butterfly flies over the flowers.".to_string()),
            audio_word: Some("mariposa_es_word.mp3".to_string()),
            audio_sentence: None,
            image_url: None,
        };

        let json = serde_json::to_value(&content).expect("Failed to serialize content");
        assert_eq!(json["word"], "mariposa");
        assert_eq!(json["source_lang"]["code"], "es");
        assert_eq!(json["audio_sentence"], serde_json::Value::Null);
        assert!(!content.is_custom());
    }
}
