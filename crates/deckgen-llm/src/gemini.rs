use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use deckgen_core::errors::ProviderError;
use deckgen_core::provider::{Completion, LlmClient, TokenUsage};

use crate::factory::LlmConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Gemini generateContent client, non-streaming.
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl GeminiClient {
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

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }

        let usage = parsed.usage_metadata.unwrap_or_default();

        Ok(Completion {
            content,
            model: self.model.clone(),
            provider: "gemini".to_string(),
            usage: TokenUsage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
            },
        })
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Default, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ProviderKind;

    fn client() -> GeminiClient {
        GeminiClient::new(&LlmConfig {
            provider: ProviderKind::Gemini,
            model: None,
            api_key: SecretString::from("test-key"),
            temperature: 0.7,
            max_tokens: 60_000,
        })
    }

    #[test]
    fn client_properties() {
        let client = client();
        assert_eq!(client.provider(), "gemini");
        assert_eq!(client.model(), "gemini-2.0-flash-exp");
    }

    #[test]
    fn endpoint_embeds_model_name() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn response_parsing_joins_parts() {
        let json = r#"{
            "candidates": [{"content": {"parts": [{"text": "<table>"}, {"text": "</table>"}]}}],
            "usageMetadata": {"promptTokenCount": 200, "candidatesTokenCount": 80}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let usage = parsed.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 200);
        assert_eq!(usage.candidates_token_count, 80);
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        assert_eq!(text, "<table></table>");
    }
}
