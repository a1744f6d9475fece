//! IP allowlist middleware.
//!
//! Restricts the API to authorized client addresses. The health endpoints
//! stay reachable for platform monitoring regardless of the list. Proxy
//! headers are honored so the check sees the original client address:
//! X-Forwarded-For (first entry) and X-Real-IP, the latter winning when
//! both are present.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use crate::server::AppState;

/// Configured set of allowed client IPs. An empty set disables the check.
pub struct IpAllowlist {
    allowed: HashSet<String>,
}

impl IpAllowlist {
    pub fn new(ips: impl IntoIterator<Item = String>) -> Self {
        let allowed: HashSet<String> = ips
            .into_iter()
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .collect();
        Self { allowed }
    }

    /// True when no allowlist is configured and every client is admitted.
    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn permits(&self, ip: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Resolve the client IP, preferring proxy headers over the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    let mut ip = peer.ip().to_string();

    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                ip = first.to_string();
            }
        }
    }

    if let Some(real) = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
    {
        let real = real.trim();
        if !real.is_empty() {
            ip = real.to_string();
        }
    }

    ip
}

fn is_health_path(path: &str) -> bool {
    path == "/health" || path == "/api/v1/health"
}

/// Axum middleware enforcing the allowlist.
pub async fn enforce(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.allowlist.is_open() {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let ip = client_ip(request.headers(), peer);

    if is_health_path(&path) {
        debug!(%ip, "health check exempt from allowlist");
        return next.run(request).await;
    }

    if !state.allowlist.permits(&ip) {
        warn!(%ip, %path, "access denied by IP allowlist");
        let body = Json(serde_json::json!({
            "error": "Access Denied",
            "message": format!("Your IP address ({ip}) is not authorized to access this service."),
            "hint": "Contact the service administrator to allowlist your IP address.",
        }));
        return (StatusCode::FORBIDDEN, body).into_response();
    }

    debug!(%ip, %path, "access granted");
    next.run(request).await
}
