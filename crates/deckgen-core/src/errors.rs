/// Typed error hierarchy for model-provider invocations.
/// Classifies errors as fatal (bad request/credentials) or retryable
/// (transient backend conditions). The orchestrator itself never retries;
/// the classification feeds logging and caller-side policy.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ProviderError {
    // Fatal
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // Retryable
    #[error("rate limited")]
    RateLimited,
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("provider overloaded")]
    ProviderOverloaded,
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServerError { .. }
                | Self::ProviderOverloaded
                | Self::NetworkError(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::InvalidRequest(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::ProviderOverloaded => "provider_overloaded",
            Self::NetworkError(_) => "network_error",
            Self::EmptyCompletion => "empty_completion",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 => Self::InvalidRequest(body),
            429 => Self::RateLimited,
            529 => Self::ProviderOverloaded,
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::ServerError { status: 500, body: "err".into() }.is_retryable());
        assert!(ProviderError::ProviderOverloaded.is_retryable());
        assert!(ProviderError::NetworkError("tcp".into()).is_retryable());
    }

    #[test]
    fn fatal_classification() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_fatal());
        assert!(ProviderError::InvalidRequest("bad".into()).is_fatal());
        assert!(!ProviderError::EmptyCompletion.is_fatal());
        assert!(!ProviderError::EmptyCompletion.is_retryable());
    }

    #[test]
    fn from_status_mapping() {
        assert!(ProviderError::from_status(401, "unauthorized".into()).is_fatal());
        assert!(ProviderError::from_status(403, "forbidden".into()).is_fatal());
        assert!(ProviderError::from_status(400, "bad request".into()).is_fatal());
        assert!(ProviderError::from_status(429, "rate limited".into()).is_retryable());
        assert!(ProviderError::from_status(529, "overloaded".into()).is_retryable());
        assert!(ProviderError::from_status(500, "internal".into()).is_retryable());
        assert!(ProviderError::from_status(502, "bad gateway".into()).is_retryable());
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(ProviderError::RateLimited.error_kind(), "rate_limited");
        assert_eq!(ProviderError::ProviderOverloaded.error_kind(), "provider_overloaded");
        assert_eq!(ProviderError::EmptyCompletion.error_kind(), "empty_completion");
    }
}
