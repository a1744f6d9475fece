use async_trait::async_trait;
use dashmap::DashMap;

use deckgen_core::ids::PresentationId;

use crate::error::StoreError;
use crate::session::SessionContext;

/// Pluggable key-value backing for session state. Backends are dumb
/// stores: TTL interpretation, locking, and expiry policy live in
/// `SessionStore`, so every backend behaves identically.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Fetch the raw stored session, expired or not.
    async fn load(&self, id: &PresentationId) -> Result<Option<SessionContext>, StoreError>;

    /// Persist a full session snapshot, replacing any prior one.
    async fn save(&self, session: &SessionContext) -> Result<(), StoreError>;

    /// Remove a session. Returns whether an entry was present.
    async fn remove(&self, id: &PresentationId) -> Result<bool, StoreError>;

    /// All stored presentation ids, for the expiry sweep.
    async fn ids(&self) -> Result<Vec<PresentationId>, StoreError>;
}

/// In-process backend for development and single-instance deployments.
#[derive(Default)]
pub struct MemoryBackend {
    sessions: DashMap<PresentationId, SessionContext>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn load(&self, id: &PresentationId) -> Result<Option<SessionContext>, StoreError> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, session: &SessionContext) -> Result<(), StoreError> {
        let _ = self
            .sessions
            .insert(session.presentation_id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, id: &PresentationId) -> Result<bool, StoreError> {
        Ok(self.sessions.remove(id).is_some())
    }

    async fn ids(&self) -> Result<Vec<PresentationId>, StoreError> {
        Ok(self.sessions.iter().map(|entry| entry.key().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(id: &str) -> SessionContext {
        SessionContext::new(PresentationId::new(id), None, None, 3600)
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let backend = MemoryBackend::new();
        let session = make_session("pres_a");
        backend.save(&session).await.unwrap();

        let loaded = backend.load(&PresentationId::new("pres_a")).await.unwrap();
        assert_eq!(loaded.unwrap().presentation_id.as_str(), "pres_a");
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let backend = MemoryBackend::new();
        let loaded = backend.load(&PresentationId::new("absent")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let backend = MemoryBackend::new();
        backend.save(&make_session("pres_a")).await.unwrap();

        assert!(backend.remove(&PresentationId::new("pres_a")).await.unwrap());
        assert!(!backend.remove(&PresentationId::new("pres_a")).await.unwrap());
    }

    #[tokio::test]
    async fn ids_lists_all_entries() {
        let backend = MemoryBackend::new();
        backend.save(&make_session("pres_a")).await.unwrap();
        backend.save(&make_session("pres_b")).await.unwrap();

        let mut ids: Vec<String> = backend
            .ids()
            .await
            .unwrap()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["pres_a", "pres_b"]);
    }
}
