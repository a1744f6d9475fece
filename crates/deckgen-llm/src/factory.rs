use std::sync::Arc;

use secrecy::SecretString;

use deckgen_core::provider::LlmClient;

use crate::anthropic::AnthropicClient;
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;

/// Errors surfaced before the service accepts traffic. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown provider: {0} (supported: gemini, openai, anthropic)")]
    UnknownProvider(String),

    #[error("missing API key: {0} is not set")]
    MissingApiKey(&'static str),

    #[error("invalid configuration value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// The closed set of model backends. Selected by configuration at startup;
/// unknown names fail fast as ConfigError.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Env var carrying this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GOOGLE_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash-exp",
            Self::OpenAi => "gpt-4-turbo-preview",
            Self::Anthropic => "claude-3-sonnet-20240229",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model backend configuration, assembled once at startup and passed in
/// explicitly. No client reads the environment after construction.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    /// Model name; None selects the provider default.
    pub model: Option<String>,
    pub api_key: SecretString,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

/// Build the configured model client.
pub fn create_client(config: &LlmConfig) -> Arc<dyn LlmClient> {
    match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiClient::new(config)),
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(config)),
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: ProviderKind) -> LlmConfig {
        LlmConfig {
            provider,
            model: None,
            api_key: SecretString::from("test-key"),
            temperature: 0.7,
            max_tokens: 60_000,
        }
    }

    #[test]
    fn provider_kind_parses_known_names() {
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
    }

    #[test]
    fn unknown_provider_fails_fast() {
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(name) if name == "mistral"));
    }

    #[test]
    fn default_models_per_provider() {
        assert_eq!(config(ProviderKind::Gemini).model_name(), "gemini-2.0-flash-exp");
        assert_eq!(config(ProviderKind::OpenAi).model_name(), "gpt-4-turbo-preview");
        assert_eq!(
            config(ProviderKind::Anthropic).model_name(),
            "claude-3-sonnet-20240229"
        );
    }

    #[test]
    fn explicit_model_overrides_default() {
        let mut cfg = config(ProviderKind::Anthropic);
        cfg.model = Some("claude-3-opus-20240229".into());
        assert_eq!(cfg.model_name(), "claude-3-opus-20240229");
    }

    #[test]
    fn create_client_honors_provider_selection() {
        use deckgen_core::provider::LlmClient as _;
        let client = create_client(&config(ProviderKind::Anthropic));
        assert_eq!(client.provider(), "anthropic");
        let client = create_client(&config(ProviderKind::OpenAi));
        assert_eq!(client.provider(), "openai");
        let client = create_client(&config(ProviderKind::Gemini));
        assert_eq!(client.provider(), "gemini");
    }
}
