use async_trait::async_trait;

use deckgen_core::ids::PresentationId;

use crate::backend::SessionBackend;
use crate::database::Database;
use crate::error::StoreError;
use crate::session::SessionContext;

/// SQLite-backed session backend. The stand-in for an external key-value
/// cache: the database file can be shared by multiple service processes.
/// Sessions are stored as one JSON payload per presentation id; the
/// last_updated column exists only for inspection and indexing.
pub struct SqliteBackend {
    db: Database,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionBackend for SqliteBackend {
    async fn load(&self, id: &PresentationId) -> Result<Option<SessionContext>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT payload FROM sessions WHERE presentation_id = ?1")?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => {
                    let payload: String = row.get(0)?;
                    let session: SessionContext = serde_json::from_str(&payload)?;
                    Ok(Some(session))
                }
                None => Ok(None),
            }
        })
    }

    async fn save(&self, session: &SessionContext) -> Result<(), StoreError> {
        let payload = serde_json::to_string(session)?;
        self.db.with_conn(|conn| {
            let _ = conn.execute(
                "INSERT INTO sessions (presentation_id, payload, last_updated)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(presentation_id) DO UPDATE SET
                     payload = excluded.payload,
                     last_updated = excluded.last_updated",
                rusqlite::params![
                    session.presentation_id.as_str(),
                    payload,
                    session.last_updated.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    async fn remove(&self, id: &PresentationId) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let removed =
                conn.execute("DELETE FROM sessions WHERE presentation_id = ?1", [id.as_str()])?;
            Ok(removed > 0)
        })
    }

    async fn ids(&self) -> Result<Vec<PresentationId>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT presentation_id FROM sessions")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(PresentationId::new).collect())
        })
    }
}
