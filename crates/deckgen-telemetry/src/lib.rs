use tracing_subscriber::EnvFilter;

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log filter. Overridden by the RUST_LOG env var.
    pub default_filter: String,
    /// Emit JSON-formatted logs (production) instead of human-readable ones.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: true,
        }
    }
}

/// Initialize the tracing subscriber. Call once at startup; repeated calls
/// are no-ops so tests that share a process stay quiet.
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    if config.json {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.default_filter, "info");
        assert!(config.json);
    }

    #[test]
    fn init_is_idempotent() {
        let config = TelemetryConfig { default_filter: "debug".into(), json: false };
        init(&config);
        init(&config);
        tracing::debug!("telemetry initialized twice without panicking");
    }
}
