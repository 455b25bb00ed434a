use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::clients::{ExampleGenerator, SpeechSynthesizer, Translator};
use crate::error::ApiError;
use crate::media::{sanitize_file_name, MediaStore};
use crate::models::language::Language;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioKind {
    Word,
    Sentence,
}

impl AudioKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioKind::Word => "word",
            AudioKind::Sentence => "sentence",
        }
    }
}

/// Field values produced for a content-cache miss. The caller persists them
/// as the immutable content row for the tuple.
#[derive(Debug, Clone)]
pub struct GeneratedFields {
    pub translation: String,
    pub example_sentence: String,
    pub example_translation: String,
    pub audio_word: Option<String>,
    pub audio_sentence: Option<String>,
}

/// Orchestrates the external services for one `(word, source, target
/// [, context])` tuple: LLM example + word translation, machine translation
/// of the sentence, TTS audio for word and sentence.
///
/// Sentence and translation failures abort the generation; audio failures
/// only log, the card works without sound and audio can be filled in later
/// through the generate-audio endpoint.
pub struct ContentPipeline {
    generator: Arc<dyn ExampleGenerator>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    media: MediaStore,
}

impl ContentPipeline {
    pub fn new(
        generator: Arc<dyn ExampleGenerator>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        media: MediaStore,
    ) -> Self {
        ContentPipeline {
            generator,
            translator,
            synthesizer,
            media,
        }
    }

    pub async fn generate(
        &self,
        word: &str,
        source: &Language,
        target: &Language,
        context: Option<&str>,
    ) -> Result<GeneratedFields, ApiError> {
        info!(
            "Generating content for '{}' ({} -> {}){}",
            word,
            source.code,
            target.code,
            context.map(|_| " with context").unwrap_or("")
        );

        let example = self
            .generator
            .generate_example(word, source, target, context)
            .await?;

        let example_translation = self
            .translator
            .translate(&example.sentence, &source.code, &target.code)
            .await?;

        let audio_word = self
            .try_synthesize(
                word,
                &source.code,
                &audio_file_name(word, source, target, context, AudioKind::Word),
            )
            .await;

        let audio_sentence = self
            .try_synthesize(
                &example.sentence,
                &source.code,
                &audio_file_name(word, source, target, context, AudioKind::Sentence),
            )
            .await;

        Ok(GeneratedFields {
            translation: example.word_translation,
            example_sentence: example.sentence,
            example_translation,
            audio_word,
            audio_sentence,
        })
    }

    /// Audio is best-effort during generation; a missing file is recorded as
    /// `None` instead of failing the whole card.
    async fn try_synthesize(&self, text: &str, lang: &str, file_name: &str) -> Option<String> {
        match self.synthesize_to_media(text, lang, file_name).await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("Audio synthesis for {} skipped: {}", file_name, e);
                None
            }
        }
    }

    /// Synthesizes `text` and stores the MP3 under the media root, returning
    /// the stored file name.
    pub async fn synthesize_to_media(
        &self,
        text: &str,
        lang: &str,
        file_name: &str,
    ) -> Result<String, ApiError> {
        let audio = self.synthesizer.synthesize(text, lang).await?;
        self.media.save_audio(file_name, &audio).await
    }
}

/// Stable audio file name for a content tuple. The target language is part
/// of the name because sentences are generated per target; custom content
/// gets a short context tag so it never collides with the shared file.
pub fn audio_file_name(
    word: &str,
    source: &Language,
    target: &Language,
    context: Option<&str>,
    kind: AudioKind,
) -> String {
    let base = match context {
        Some(context) => {
            let digest = Sha256::digest(context.as_bytes());
            format!(
                "{}_{}-{}_{:x}",
                word,
                source.code,
                target.code,
                // six hex chars are enough to separate contexts
                u32::from_be_bytes([digest[0], digest[1], digest[2], 0]) >> 8
            )
        }
        None => format!("{}_{}-{}", word, source.code, target.code),
    };

    sanitize_file_name(&format!("{}_{}.mp3", base, kind.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::{MockGenerator, MockMode, MockSynthesizer, MockTranslator};

    fn lang(id: i32, code: &str, name: &str) -> Language {
        Language {
            id,
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn pipeline(
        generator: MockMode,
        translator: MockMode,
        synthesizer: MockMode,
        media: MediaStore,
    ) -> ContentPipeline {
        ContentPipeline::new(
            Arc::new(MockGenerator::new(generator)),
            Arc::new(MockTranslator::new(translator)),
            Arc::new(MockSynthesizer::new(synthesizer)),
            media,
        )
    }

    #[tokio::test]
    async fn test_generate_produces_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        media.ensure_layout().await.unwrap();

        let pipeline = pipeline(MockMode::Succeed, MockMode::Succeed, MockMode::Succeed, media.clone());
        let source = lang(1, "es", "Spanish");
        let target = lang(2, "en", "English");

        let fields = pipeline
            .generate("mariposa", &source, &target, None)
            .await
            .unwrap();

        assert_eq!(fields.translation, "mariposa-translated");
        assert_eq!(fields.example_sentence, "[es] A sentence with mariposa.");
        assert_eq!(
            fields.example_translation,
            "[en] [es] A sentence with mariposa."
        );

        let word_audio = fields.audio_word.unwrap();
        assert_eq!(word_audio, "mariposa_es-en_word.mp3");
        assert!(media.audio_path(&word_audio).exists());
        assert!(fields.audio_sentence.is_some());
    }

    #[tokio::test]
    async fn test_generator_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        media.ensure_layout().await.unwrap();

        let pipeline = pipeline(MockMode::Fail, MockMode::Succeed, MockMode::Succeed, media);
        let result = pipeline
            .generate("mariposa", &lang(1, "es", "Spanish"), &lang(2, "en", "English"), None)
            .await;

        assert!(matches!(result, Err(ApiError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_translator_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        media.ensure_layout().await.unwrap();

        let pipeline = pipeline(MockMode::Succeed, MockMode::Fail, MockMode::Succeed, media);
        let result = pipeline
            .generate("mariposa", &lang(1, "es", "Spanish"), &lang(2, "en", "English"), None)
            .await;

        assert!(matches!(result, Err(ApiError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_audio_failure_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        media.ensure_layout().await.unwrap();

        let pipeline = pipeline(MockMode::Succeed, MockMode::Succeed, MockMode::Fail, media);
        let fields = pipeline
            .generate("mariposa", &lang(1, "es", "Spanish"), &lang(2, "en", "English"), None)
            .await
            .unwrap();

        assert!(fields.audio_word.is_none());
        assert!(fields.audio_sentence.is_none());
        assert!(!fields.example_sentence.is_empty());
    }

    #[test]
    fn test_audio_file_names_are_distinct_per_context() {
        let source = lang(1, "es", "Spanish");
        let target = lang(2, "en", "English");

        let shared = audio_file_name("mariposa", &source, &target, None, AudioKind::Sentence);
        let custom =
            audio_file_name("mariposa", &source, &target, Some("biology"), AudioKind::Sentence);
        let other_context =
            audio_file_name("mariposa", &source, &target, Some("poetry"), AudioKind::Sentence);

        assert_eq!(shared, "mariposa_es-en_sentence.mp3");
        assert_ne!(shared, custom);
        assert_ne!(custom, other_context);
    }

    #[test]
    fn test_audio_file_names_are_sanitized() {
        let source = lang(1, "fr", "French");
        let target = lang(2, "en", "English");

        let name = audio_file_name("crème brûlée", &source, &target, None, AudioKind::Word);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c)));
    }
}
