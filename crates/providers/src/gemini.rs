use std::time::Duration;

use {
    async_trait::async_trait,
    receptionist_config::LlmConfig,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, trace, warn},
};

use crate::LanguageModel;

/// Gemini `generateContent` client.
pub struct GeminiProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: Secret<String>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider whose requests time out after `llm.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            ..Self::new(
                config.api_key.clone(),
                config.model.clone(),
                config.base_url.clone(),
            )
        })
    }
}

/// Concatenate the text parts of a candidate, ignoring non-text parts.
fn extract_text(parts: &[serde_json::Value]) -> Option<String> {
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join(""))
    }
}

#[async_trait]
impl LanguageModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "gemini generate request"
        );

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let http_resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body_text, "gemini API error");
            anyhow::bail!("Gemini API error HTTP {status}: {body_text}");
        }

        let resp = http_resp.json::<serde_json::Value>().await?;
        trace!(response = %resp, "gemini raw response");

        let parts = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        match extract_text(&parts) {
            Some(text) => Ok(text),
            None => {
                let reason = resp["promptFeedback"]["blockReason"]
                    .as_str()
                    .or_else(|| resp["candidates"][0]["finishReason"].as_str())
                    .unwrap_or("no text parts");
                anyhow::bail!("Gemini returned no text ({reason})")
            },
        }
    }
}
