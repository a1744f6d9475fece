use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;

/// Token usage counters as reported by the provider for one completion.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A single non-streaming completion from a model backend.
#[derive(Clone, Debug)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub usage: TokenUsage,
}

/// Trait implemented by each model backend (Gemini, OpenAI, Anthropic)
/// plus the test mock. Accepts a fully rendered prompt and returns the
/// generated text with usage counters. Retry policy, if any, lives behind
/// this trait, never in front of it.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> &str;
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<Completion, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_total() {
        let usage = TokenUsage { prompt_tokens: 120, completion_tokens: 45 };
        assert_eq!(usage.total_tokens(), 165);
    }

    #[test]
    fn usage_default_is_zero() {
        let usage = TokenUsage::default();
        assert_eq!(usage.total_tokens(), 0);
    }
}
