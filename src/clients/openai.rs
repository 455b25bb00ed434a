use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;
use tracing::warn;

use crate::clients::{ExampleGenerator, GeneratedExample};
use crate::config::OpenAiConfig;
use crate::error::ApiError;
use crate::models::language::Language;

const SYSTEM_PROMPT: &str =
    "You generate example sentences for language learners. Answer in exactly two lines: \
     'Example sentence: <sentence>' and 'Translation: <short word translation>'.";

const MAX_ATTEMPTS: u32 = 3;

/// Chat-completions client for example sentence generation.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(config: &OpenAiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(OpenAiGenerator {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7,
            "max_tokens": 150
        });

        // Bounded retry with exponential backoff
        let mut last_err = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    let json: Value = response.json().await.map_err(|e| {
                        ApiError::upstream("completion", format!("Invalid response body: {}", e))
                    })?;

                    let content = json["choices"][0]["message"]["content"]
                        .as_str()
                        .unwrap_or("")
                        .trim()
                        .to_string();

                    if content.is_empty() {
                        return Err(ApiError::upstream("completion", "Empty completion"));
                    }

                    return Ok(content);
                }
                Ok(response) => {
                    last_err = format!("HTTP {}", response.status());
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }

            warn!(
                "Completion attempt {}/{} failed: {}",
                attempt, MAX_ATTEMPTS, last_err
            );
            sleep(std::time::Duration::from_millis(100 * 2u64.pow(attempt))).await;
        }

        Err(ApiError::upstream("completion", last_err))
    }
}

#[async_trait]
impl ExampleGenerator for OpenAiGenerator {
    async fn generate_example(
        &self,
        word: &str,
        source: &Language,
        target: &Language,
        context: Option<&str>,
    ) -> Result<GeneratedExample, ApiError> {
        let prompt = build_prompt(word, source, target, context);
        let reply = self.complete(&prompt).await?;

        parse_example_reply(&reply).map_err(|e| ApiError::upstream("completion", e))
    }
}

pub fn build_prompt(
    word: &str,
    source: &Language,
    target: &Language,
    context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Create a simple example sentence in {} using the word '{}', then give a short {} \
         translation of the word (a word or short phrase, not a sentence).",
        source.name, word, target.name
    );

    if let Some(context) = context {
        prompt.push_str(&format!(
            " The sentence must fit this context: {}.",
            context
        ));
    }

    prompt
}

/// Parses the two-line completion reply by prefix matching, with a bare
/// two-line fallback when the model ignored the prefixes.
pub fn parse_example_reply(reply: &str) -> Result<GeneratedExample, String> {
    let lines: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut sentence = None;
    let mut word_translation = None;

    for line in &lines {
        if let Some(rest) = strip_prefix_ignore_case(line, "Example sentence:") {
            sentence = Some(rest.trim().to_string());
        } else if let Some(rest) = strip_prefix_ignore_case(line, "Translation:") {
            word_translation = Some(rest.trim().to_string());
        }
    }

    // Fallback: unprefixed replies with at least two lines
    if sentence.is_none() && word_translation.is_none() && lines.len() >= 2 {
        sentence = Some(lines[0].to_string());
        word_translation = Some(lines[1].to_string());
    }

    let sentence = sentence
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Reply did not contain an example sentence".to_string())?;

    let word_translation = word_translation
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Reply did not contain a word translation".to_string())?;

    let word_translation = normalize_word_translation(&word_translation)?;

    Ok(GeneratedExample {
        sentence,
        word_translation,
    })
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len()
        && line.is_char_boundary(prefix.len())
        && line[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

/// The word translation must be a gloss, not a sentence.
fn normalize_word_translation(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('.').trim();

    if trimmed.is_empty() {
        return Err("Word translation is empty".to_string());
    }

    if trimmed.split_whitespace().count() > 8 {
        return Err(format!(
            "Word translation looks like a full sentence: '{}'",
            raw
        ));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str, name: &str) -> Language {
        Language {
            id: 0,
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_prefixed_reply() {
        let reply = "Example sentence: La mariposa vuela sobre las flores.\n\
                     Translation: butterfly";

        let parsed = parse_example_reply(reply).unwrap();
        assert_eq!(parsed.sentence, "La mariposa vuela sobre las flores.");
        assert_eq!(parsed.word_translation, "butterfly");
    }

    #[test]
    fn test_parse_reply_with_blank_lines_and_case() {
        let reply = "\nexample sentence: El sol brilla.\n\nTRANSLATION: the sun\n";

        let parsed = parse_example_reply(reply).unwrap();
        assert_eq!(parsed.sentence, "El sol brilla.");
        assert_eq!(parsed.word_translation, "the sun");
    }

    #[test]
    fn test_parse_unprefixed_two_line_fallback() {
        let reply = "La mariposa vuela.\nbutterfly";

        let parsed = parse_example_reply(reply).unwrap();
        assert_eq!(parsed.sentence, "La mariposa vuela.");
        assert_eq!(parsed.word_translation, "butterfly");
    }

    #[test]
    fn test_parse_rejects_single_line() {
        assert!(parse_example_reply("just one line without prefixes").is_err());
    }

    #[test]
    fn test_parse_rejects_sentence_as_word_translation() {
        let reply = "Example sentence: La mariposa vuela sobre las flores.\n\
                     Translation: The butterfly is a beautiful insect that flies over all the flowers.";

        assert!(parse_example_reply(reply).is_err());
    }

    #[test]
    fn test_translation_trailing_period_is_stripped() {
        let reply = "Example sentence: La mariposa vuela.\nTranslation: butterfly.";

        let parsed = parse_example_reply(reply).unwrap();
        assert_eq!(parsed.word_translation, "butterfly");
    }

    #[test]
    fn test_build_prompt_weaves_context() {
        let prompt = build_prompt(
            "mariposa",
            &lang("es", "Spanish"),
            &lang("en", "English"),
            Some("a biology lesson"),
        );

        assert!(prompt.contains("Spanish"));
        assert!(prompt.contains("English"));
        assert!(prompt.contains("'mariposa'"));
        assert!(prompt.contains("a biology lesson"));

        let plain = build_prompt("mariposa", &lang("es", "Spanish"), &lang("en", "English"), None);
        assert!(!plain.contains("context"));
    }
}
