use async_trait::async_trait;
use reqwest::Client;

use crate::clients::SpeechSynthesizer;
use crate::config::TtsConfig;
use crate::error::ApiError;

/// The endpoint rejects long inputs, so text is synthesized in chunks and
/// the MP3 frames concatenated, the same strategy gTTS uses.
const MAX_CHUNK_CHARS: usize = 180;

/// Google Translate TTS client (`translate_tts` endpoint), returning MP3.
pub struct TranslateTts {
    client: Client,
    endpoint: String,
}

impl TranslateTts {
    pub fn new(config: &TtsConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(TranslateTts {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn fetch_chunk(&self, text: &str, lang: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| ApiError::upstream("tts", e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::upstream(
                "tts",
                format!("HTTP {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::upstream("tts", format!("Failed to read audio body: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::upstream("tts", "Empty audio response"));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for TranslateTts {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::validation("Cannot synthesize empty text"));
        }

        let mut audio = Vec::new();
        for chunk in split_into_chunks(text, MAX_CHUNK_CHARS) {
            audio.extend(self.fetch_chunk(&chunk, lang).await?);
        }

        Ok(audio)
    }
}

/// Splits on whitespace into chunks of at most `max_chars` characters.
/// A single over-long token becomes its own chunk rather than being dropped.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for token in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + token.chars().count() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(token);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_into_chunks("La mariposa vuela.", 180);
        assert_eq!(chunks, vec!["La mariposa vuela.".to_string()]);
    }

    #[test]
    fn test_long_text_splits_on_whitespace() {
        let text = "uno dos tres cuatro cinco seis";
        let chunks = split_into_chunks(text, 12);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_overlong_token_is_kept() {
        let chunks = split_into_chunks("supercalifragilisticoespialidoso", 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "supercalifragilisticoespialidoso");
    }
}
