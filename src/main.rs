mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use deckgen_engine::ContentGenerator;
use deckgen_store::{Database, MemoryBackend, SessionBackend, SessionStore, SqliteBackend};

use crate::config::{AppConfig, StoreBackendKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    deckgen_telemetry::init(&config.telemetry);

    info!(
        provider = %config.llm.provider,
        model = config.llm.model_name(),
        ttl_seconds = config.store.default_ttl_seconds,
        max_history = config.store.max_history,
        tolerance = config.generator.word_count_tolerance,
        backend = ?config.backend,
        "starting deckgen"
    );

    let llm = deckgen_llm::create_client(&config.llm);

    let backend: Arc<dyn SessionBackend> = match config.backend {
        StoreBackendKind::Memory => Arc::new(MemoryBackend::new()),
        StoreBackendKind::Sqlite => {
            let db = Database::open(&config.db_path).context("failed to open session database")?;
            Arc::new(SqliteBackend::new(db))
        }
    };
    let sessions = Arc::new(SessionStore::new(backend, config.store));

    let generator = Arc::new(ContentGenerator::new(
        llm,
        Arc::clone(&sessions),
        config.generator,
    ));

    let handle = deckgen_server::start(config.server, generator)
        .await
        .context("failed to start server")?;

    info!(port = handle.port, "service ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    info!("shutting down");
    handle.shutdown();

    match sessions.cleanup_expired_sessions().await {
        Ok(removed) => info!(removed, "final session sweep complete"),
        Err(e) => warn!(error = %e, "final session sweep failed"),
    }

    Ok(())
}
