use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::clients::Translator;
use crate::config::TranslateConfig;
use crate::error::ApiError;

/// Google Translate v2 REST client, API-key authenticated.
pub struct GoogleTranslator {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(GoogleTranslator {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "q": text,
            "source": source,
            "target": target,
            "format": "text"
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream("translation", e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::upstream(
                "translation",
                format!("HTTP {}", response.status()),
            ));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ApiError::upstream("translation", format!("Invalid response body: {}", e)))?;

        let translated = json["data"]["translations"][0]["translatedText"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        if translated.is_empty() {
            return Err(ApiError::upstream("translation", "Empty translation"));
        }

        Ok(translated)
    }
}
