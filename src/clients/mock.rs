//! Deterministic in-process client implementations used by the pipeline
//! tests. No network access, stable outputs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::clients::{ExampleGenerator, GeneratedExample, SpeechSynthesizer, Translator};
use crate::error::ApiError;
use crate::models::language::Language;

/// How a mock client behaves when called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockMode {
    /// Return a deterministic success value.
    Succeed,
    /// Fail every call with an upstream error.
    Fail,
}

pub struct MockGenerator {
    pub mode: MockMode,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new(mode: MockMode) -> Self {
        MockGenerator {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExampleGenerator for MockGenerator {
    async fn generate_example(
        &self,
        word: &str,
        source: &Language,
        _target: &Language,
        context: Option<&str>,
    ) -> Result<GeneratedExample, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            MockMode::Succeed => Ok(GeneratedExample {
                sentence: match context {
                    Some(context) => format!("[{}] A sentence with {} about {}.", source.code, word, context),
                    None => format!("[{}] A sentence with {}.", source.code, word),
                },
                word_translation: format!("{}-translated", word),
            }),
            MockMode::Fail => Err(ApiError::upstream("completion", "mock failure")),
        }
    }
}

pub struct MockTranslator {
    pub mode: MockMode,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        MockTranslator { mode }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String, ApiError> {
        match self.mode {
            MockMode::Succeed => Ok(format!("[{}] {}", target, text)),
            MockMode::Fail => Err(ApiError::upstream("translation", "mock failure")),
        }
    }
}

pub struct MockSynthesizer {
    pub mode: MockMode,
}

impl MockSynthesizer {
    pub fn new(mode: MockMode) -> Self {
        MockSynthesizer { mode }
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, ApiError> {
        match self.mode {
            MockMode::Succeed => Ok(format!("MP3:{}:{}", lang, text).into_bytes()),
            MockMode::Fail => Err(ApiError::upstream("tts", "mock failure")),
        }
    }
}
