use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use deckgen_engine::ContentGenerator;
use deckgen_store::SessionStore;

use crate::allowlist::{self, IpAllowlist};
use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins; a single "*" entry means permissive.
    pub allowed_origins: Vec<String>,
    /// Client IP allowlist; empty means open access.
    pub allowed_ips: Vec<String>,
    /// Interval between expired-session sweeps.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            allowed_origins: vec!["*".to_string()],
            allowed_ips: Vec::new(),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<ContentGenerator>,
    pub allowlist: Arc<IpAllowlist>,
    /// Parent token for per-request cancellation; cancelled at shutdown so
    /// in-flight generations drop their results instead of applying them.
    pub shutdown: CancellationToken,
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/", get(handlers::service_root))
        .route("/health", get(handlers::health))
        .route("/generate/text", post(handlers::generate_text))
        .route("/generate/table", post(handlers::generate_table))
        .route("/generate/batch/text", post(handlers::generate_batch_text))
        .route("/generate/batch/table", post(handlers::generate_batch_table))
        .route(
            "/session/{presentation_id}",
            get(handlers::session_info).delete(handlers::delete_session),
        );

    Router::new()
        .route("/", get(handlers::service_root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(state.clone(), allowlist::enforce))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create and start the server. Returns a handle that keeps the background
/// tasks alive and can shut the service down.
pub async fn start(
    config: ServerConfig,
    generator: Arc<ContentGenerator>,
) -> Result<ServerHandle, std::io::Error> {
    let allowlist = Arc::new(IpAllowlist::new(config.allowed_ips.clone()));
    if !allowlist.is_open() {
        info!(allowed = allowlist.len(), "IP allowlist enabled");
    }

    let shutdown = CancellationToken::new();
    let state = AppState {
        generator,
        allowlist,
        shutdown: shutdown.clone(),
    };

    let sweeper = spawn_sweep(
        state.generator.sessions().clone(),
        config.sweep_interval,
        shutdown.clone(),
    );

    let router = build_router(state, &config.allowed_origins);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });

    info!(port = local_addr.port(), "deckgen server started");

    Ok(ServerHandle {
        port: local_addr.port(),
        shutdown,
        _server: server,
        _sweeper: sweeper,
    })
}

/// Handle returned by `start()` — keeps background tasks alive.
pub struct ServerHandle {
    pub port: u16,
    shutdown: CancellationToken,
    _server: tokio::task::JoinHandle<()>,
    _sweeper: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Cancel in-flight generation and stop the sweep task. Late model
    /// results are dropped by their request pipelines, never applied.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Periodic expired-session sweep, cancelled at shutdown.
fn spawn_sweep(
    sessions: Arc<SessionStore>,
    interval: Duration,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so the sweep starts one
        // interval after boot.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = sessions.cleanup_expired_sessions().await {
                        warn!(error = %e, "session sweep failed");
                    }
                }
            }
        }
    })
}
