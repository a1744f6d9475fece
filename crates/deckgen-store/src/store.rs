use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use deckgen_core::ids::PresentationId;

use crate::backend::{MemoryBackend, SessionBackend};
use crate::error::StoreError;
use crate::session::{first_slide_sentinel, SessionContext, SlideContext};

#[derive(Clone, Copy, Debug)]
pub struct SessionStoreConfig {
    /// TTL applied to newly created sessions, in seconds. Expiry slides:
    /// every mutation refreshes last_updated.
    pub default_ttl_seconds: u64,
    /// Maximum slides retained in a session's history.
    pub max_history: usize,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600,
            max_history: 5,
        }
    }
}

/// Session lifecycle owner: creation, slide-history append, TTL expiry,
/// context summarization. All read-modify-write paths for one presentation
/// serialize on a per-presentation async mutex, so concurrent appends are
/// never lost and the expiry sweep cannot delete a session mid-append.
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    config: SessionStoreConfig,
    locks: DashMap<PresentationId, Arc<Mutex<()>>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>, config: SessionStoreConfig) -> Self {
        Self {
            backend,
            config,
            locks: DashMap::new(),
        }
    }

    /// Convenience constructor with the in-memory backend.
    pub fn in_memory(config: SessionStoreConfig) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), config)
    }

    pub fn config(&self) -> SessionStoreConfig {
        self.config
    }

    fn lock_for(&self, id: &PresentationId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a session, treating an expired entry as absent.
    async fn load_live(&self, id: &PresentationId) -> Result<Option<SessionContext>, StoreError> {
        match self.backend.load(id).await? {
            Some(session) if session.is_expired(Utc::now()) => Ok(None),
            other => Ok(other),
        }
    }

    /// Return the existing unexpired session, or atomically create one with
    /// the given theme/audience and an empty history. Under concurrency
    /// exactly one creation wins; every caller observes the same session.
    #[instrument(skip(self, theme, audience), fields(presentation_id = %id))]
    pub async fn get_or_create(
        &self,
        id: &PresentationId,
        theme: Option<String>,
        audience: Option<String>,
    ) -> Result<SessionContext, StoreError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        if let Some(session) = self.backend.load(id).await? {
            if !session.is_expired(Utc::now()) {
                debug!("retrieved existing session");
                return Ok(session);
            }
            // Expired entry still on disk: drop it before recreating.
            let _ = self.backend.remove(id).await?;
        }

        let session = SessionContext::new(
            id.clone(),
            theme,
            audience,
            self.config.default_ttl_seconds,
        );
        self.backend.save(&session).await?;
        info!("created new session");
        Ok(session)
    }

    /// Append or replace a slide in the session's history and refresh
    /// last_updated. Fails with NotFound when the session does not exist;
    /// callers must get_or_create first.
    #[instrument(skip(self, slide), fields(presentation_id = %id, slide_id = %slide.slide_id))]
    pub async fn add_slide(
        &self,
        id: &PresentationId,
        slide: SlideContext,
    ) -> Result<(), StoreError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut session = self
            .load_live(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("session {id}")))?;

        session.upsert_slide(slide, self.config.max_history);
        self.backend.save(&session).await?;
        debug!(slides = session.slide_history.len(), "slide added to session");
        Ok(())
    }

    /// Digest of the most recent `max_slides` history entries for prompt
    /// injection. Never errors: a missing or expired session, an empty
    /// history, or a backend fault all yield the first-slide sentinel so
    /// prompt building stays resilient.
    pub async fn get_context_summary(&self, id: &PresentationId, max_slides: usize) -> String {
        match self.load_live(id).await {
            Ok(Some(session)) => session.context_summary(max_slides),
            Ok(None) => first_slide_sentinel(),
            Err(e) => {
                warn!(presentation_id = %id, error = %e, "context summary unavailable, using sentinel");
                first_slide_sentinel()
            }
        }
    }

    /// Read-only fetch; None when absent or expired.
    pub async fn get_session_context(
        &self,
        id: &PresentationId,
    ) -> Result<Option<SessionContext>, StoreError> {
        self.load_live(id).await
    }

    /// Remove a session. Idempotent: deleting an absent session succeeds.
    #[instrument(skip(self), fields(presentation_id = %id))]
    pub async fn delete_session(&self, id: &PresentationId) -> Result<(), StoreError> {
        let lock = self.lock_for(id);
        {
            let _guard = lock.lock().await;
            let removed = self.backend.remove(id).await?;
            if removed {
                info!("session deleted");
            }
        }
        self.locks.remove(id);
        Ok(())
    }

    /// Scan all sessions and remove the expired ones. Each check-and-delete
    /// holds the same per-presentation lock as the append path, so a session
    /// with an in-flight add_slide is never swept away underneath it.
    pub async fn cleanup_expired_sessions(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for id in self.backend.ids().await? {
            let lock = self.lock_for(&id);
            let _guard = lock.lock().await;
            match self.backend.load(&id).await? {
                Some(session) if session.is_expired(Utc::now()) => {
                    if self.backend.remove(&id).await? {
                        removed += 1;
                    }
                }
                _ => {}
            }
        }
        if removed > 0 {
            info!(removed, "cleaned up expired sessions");
        }
        Ok(removed)
    }
}
