// Outbound service clients
// Thin reqwest wrappers behind traits so the generation pipeline can be
// exercised without network access.

pub mod mock;
pub mod openai;
pub mod translate;
pub mod tts;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::language::Language;

pub use openai::OpenAiGenerator;
pub use translate::GoogleTranslator;
pub use tts::TranslateTts;

/// Parsed output of one example-sentence generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedExample {
    pub sentence: String,
    pub word_translation: String,
}

/// Produces an example sentence in the source language plus a short
/// translation of the word into the target language.
#[async_trait]
pub trait ExampleGenerator: Send + Sync {
    async fn generate_example(
        &self,
        word: &str,
        source: &Language,
        target: &Language,
        context: Option<&str>,
    ) -> Result<GeneratedExample, ApiError>;
}

/// Machine translation of running text between two language codes.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, ApiError>;
}

/// Text-to-speech synthesis returning MP3 bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, ApiError>;
}
