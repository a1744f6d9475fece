use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

use deckgen_engine::GeneratorConfig;
use deckgen_llm::{ConfigError, LlmConfig, ProviderKind};
use deckgen_server::ServerConfig;
use deckgen_store::SessionStoreConfig;
use deckgen_telemetry::TelemetryConfig;

/// Which backing store holds session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackendKind {
    Memory,
    Sqlite,
}

/// Full service configuration, read from the environment exactly once at
/// startup. Invalid values are fatal before the listener binds.
pub struct AppConfig {
    pub llm: LlmConfig,
    pub backend: StoreBackendKind,
    pub db_path: PathBuf,
    pub store: SessionStoreConfig,
    pub generator: GeneratorConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let provider: ProviderKind = env_or("LLM_PROVIDER", "gemini").parse()?;
        let api_key = std::env::var(provider.api_key_var())
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingApiKey(provider.api_key_var()))?;

        let llm = LlmConfig {
            provider,
            model: std::env::var("LLM_MODEL").ok(),
            api_key,
            temperature: parse_env("LLM_TEMPERATURE", 0.7)?,
            max_tokens: parse_env("LLM_MAX_TOKENS", 60_000)?,
        };

        let backend = match env_or("SESSION_BACKEND", "memory").to_ascii_lowercase().as_str() {
            "memory" => StoreBackendKind::Memory,
            "sqlite" => StoreBackendKind::Sqlite,
            other => anyhow::bail!("unknown SESSION_BACKEND: {other} (supported: memory, sqlite)"),
        };
        let db_path = std::env::var("SESSION_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        let store = SessionStoreConfig {
            default_ttl_seconds: parse_env("SESSION_CACHE_TTL", 3600)?,
            max_history: parse_env("SESSION_MAX_HISTORY", 5)?,
        };

        let generator = GeneratorConfig {
            word_count_tolerance: parse_env("WORD_COUNT_TOLERANCE", 0.10)?,
        };

        let server = ServerConfig {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8001)?,
            allowed_origins: split_env("ALLOWED_ORIGINS", "*"),
            allowed_ips: std::env::var("ALLOWED_IPS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            sweep_interval: Duration::from_secs(parse_env("SESSION_SWEEP_INTERVAL_SECS", 300)?),
        };

        let telemetry = TelemetryConfig {
            default_filter: env_or("LOG_LEVEL", "info"),
            json: env_or("LOG_FORMAT", "json").eq_ignore_ascii_case("json"),
        };

        Ok(Self {
            llm,
            backend,
            db_path,
            store,
            generator,
            server,
            telemetry,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

fn split_env(name: &str, default: &str) -> Vec<String> {
    split_list(&env_or(name, default))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_db_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".deckgen")
        .join("sessions.db")
}
