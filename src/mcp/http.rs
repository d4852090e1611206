//! Streamable HTTP transport for networked MCP clients.
//!
//! Mounts rmcp's [`StreamableHttpService`] at `/mcp` behind an axum router,
//! next to a plain `GET /health` check. Every HTTP session gets its own
//! [`SlackMcpServer`] sharing one [`AppState`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::handler::{AppState, SlackMcpServer};
use crate::{AppError, Result};

/// Handler for `GET /health`: 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Build the axum router serving `/mcp` and `/health`.
pub fn router(state: Arc<AppState>) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(SlackMcpServer::new(Arc::clone(&state))),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .nest_service("/mcp", service)
        .route("/health", get(health))
}

/// Bind `addr` and serve until `ct` fires.
///
/// # Errors
///
/// Returns `AppError::Io` if the listener cannot bind, or `AppError::Mcp`
/// if the server stops with an error.
pub async fn serve_http(state: Arc<AppState>, addr: SocketAddr, ct: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind HTTP transport on {addr}: {err}")))?;
    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` fires.
///
/// # Errors
///
/// Returns `AppError::Mcp` if the server stops with an error.
pub async fn serve_on(listener: TcpListener, state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let local = listener.local_addr()?;
    let app = router(state);

    info!(addr = %local, "starting streamable HTTP MCP transport");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Mcp(format!("HTTP server error: {err}")))?;

    info!("streamable HTTP MCP transport shut down");
    Ok(())
}
