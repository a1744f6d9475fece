use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use deckgen_core::errors::ProviderError;
use deckgen_core::provider::{Completion, LlmClient, TokenUsage};

use crate::factory::LlmConfig;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anthropic Messages API client, non-streaming.
pub struct AnthropicClient {
    client: Client,
    api_key: SecretString,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key: config.api_key.clone(),
            model: config.model_name().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let content = parsed
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }

        Ok(Completion {
            content,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
            provider: "anthropic".to_string(),
            usage: TokenUsage {
                prompt_tokens: parsed.usage.input_tokens,
                completion_tokens: parsed.usage.output_tokens,
            },
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ProviderKind;

    fn client() -> AnthropicClient {
        AnthropicClient::new(&LlmConfig {
            provider: ProviderKind::Anthropic,
            model: None,
            api_key: SecretString::from("test-key"),
            temperature: 0.7,
            max_tokens: 60_000,
        })
    }

    #[test]
    fn client_properties() {
        let client = client();
        assert_eq!(client.provider(), "anthropic");
        assert_eq!(client.model(), "claude-3-sonnet-20240229");
    }

    #[test]
    fn response_parsing_joins_text_blocks() {
        let json = r#"{
            "content": [{"type": "text", "text": "<p>Q3 "}, {"type": "text", "text": "results</p>"}],
            "model": "claude-3-sonnet-20240229",
            "usage": {"input_tokens": 120, "output_tokens": 40}
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        let content: String = parsed
            .content
            .iter()
            .filter_map(|b| b.text.as_deref())
            .collect();
        assert_eq!(content, "<p>Q3 results</p>");
        assert_eq!(parsed.usage.input_tokens, 120);
        assert_eq!(parsed.usage.output_tokens, 40);
    }

    #[test]
    fn response_parsing_tolerates_missing_usage() {
        let json = r#"{"content": [{"type": "text", "text": "x"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.usage.input_tokens, 0);
        assert!(parsed.model.is_none());
    }
}
