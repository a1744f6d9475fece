use deckgen_core::errors::ProviderError;
use deckgen_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("session store error: {0}")]
    Store(StoreError),

    #[error("request cancelled")]
    Cancelled,
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(message) => Self::SessionNotFound(message),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_session_not_found() {
        let err: EngineError = StoreError::NotFound("session pres_a".into()).into();
        assert!(matches!(err, EngineError::SessionNotFound(_)));
    }

    #[test]
    fn other_store_errors_stay_store_errors() {
        let err: EngineError = StoreError::Database("locked".into()).into();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[test]
    fn provider_errors_convert() {
        let err: EngineError = ProviderError::RateLimited.into();
        assert!(matches!(err, EngineError::Provider(ProviderError::RateLimited)));
    }
}
