#![forbid(unsafe_code)]

//! `slack-mcp-server`: MCP server binary exposing a Slack workspace.
//!
//! Bootstraps configuration and credentials, then serves MCP over stdio,
//! Streamable HTTP, or both until a shutdown signal arrives.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use slack_mcp_server::config::SlackCredentials;
use slack_mcp_server::config_watcher::{apply_rotations, CredentialWatcher};
use slack_mcp_server::mcp::handler::AppState;
use slack_mcp_server::mcp::{http, transport};
use slack_mcp_server::{AppError, GlobalConfig, Result};

const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum TransportMode {
    Stdio,
    Http,
    Both,
}

#[derive(Debug, Parser)]
#[command(name = "slack-mcp-server", about = "MCP server for Slack workspaces", version, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dotenv file with Slack tokens; defaults to `.env` when present.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Which MCP transport(s) to serve.
    #[arg(long, value_enum, default_value_t = TransportMode::Stdio)]
    transport: TransportMode,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the HTTP transport port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Load the env file before tracing so RUST_LOG from it takes effect.
    let env_file = resolve_env_file(args.env_file.as_deref());
    let env_loaded = env_file
        .as_deref()
        .map(|path| dotenvy::from_path(path).map(|()| path.to_path_buf()));

    init_tracing(args.log_format)?;
    info!("slack-mcp-server bootstrap");

    match env_loaded {
        Some(Ok(path)) => info!(path = %path.display(), "loaded env file"),
        Some(Err(err)) => warn!(%err, "failed to load env file"),
        None => {}
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args, env_file))
}

fn resolve_env_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_ENV_FILE);
            default.is_file().then_some(default)
        }
    }
}

async fn run(args: Cli, env_file: Option<PathBuf>) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(port) = args.port {
        config.http_port = port;
    }
    info!(
        posting_enabled = config.posting.enabled,
        allowlisted = config.posting.allowed_channels.len(),
        "configuration loaded"
    );

    let credentials = SlackCredentials::load().await?;
    let state = Arc::new(AppState::from_credentials(Arc::new(config), &credentials)?);

    let ct = CancellationToken::new();

    // ── Credential hot-reload ───────────────────────────
    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = match env_file.as_deref().filter(|p| p.is_file()) {
        Some(path) => match CredentialWatcher::for_env_file(path, tx) {
            Ok(watcher) => {
                info!(path = %watcher.path().display(), "credential hot-reload enabled");
                Some(watcher)
            }
            Err(err) => {
                warn!(%err, "credential hot-reload unavailable");
                None
            }
        },
        None => None,
    };
    let rotation_handle = tokio::spawn(apply_rotations(Arc::clone(&state), rx, ct.clone()));

    // ── Start transports ────────────────────────────────
    let mut stdio_handle = None;
    if matches!(args.transport, TransportMode::Stdio | TransportMode::Both) {
        let stdio_ct = ct.clone();
        let stdio_state = Arc::clone(&state);
        stdio_handle = Some(tokio::spawn(async move {
            if let Err(err) = transport::serve_stdio(stdio_state, stdio_ct).await {
                error!(%err, "stdio transport failed");
            }
        }));
    }

    let mut http_handle = None;
    if matches!(args.transport, TransportMode::Http | TransportMode::Both) {
        let addr: SocketAddr = format!("{}:{}", state.config.http_host, state.config.http_port)
            .parse()
            .map_err(|err| AppError::Config(format!("invalid HTTP bind address: {err}")))?;
        let http_ct = ct.clone();
        let http_state = Arc::clone(&state);
        http_handle = Some(tokio::spawn(async move {
            if let Err(err) = http::serve_http(http_state, addr, http_ct).await {
                error!(%err, "http transport failed");
            }
        }));
    }

    info!(transport = ?args.transport, "MCP server ready");

    // ── Wait for shutdown ───────────────────────────────
    // In stdio-only mode the server also stops when the client disconnects.
    match (args.transport, stdio_handle.as_mut()) {
        (TransportMode::Stdio, Some(handle)) => {
            tokio::select! {
                () = shutdown_signal() => info!("shutdown signal received"),
                _ = handle => info!("stdio client disconnected"),
            }
        }
        _ => {
            shutdown_signal().await;
            info!("shutdown signal received");
        }
    }
    ct.cancel();

    // ── Wait for background tasks ───────────────────────
    if let Some(handle) = http_handle {
        let _ = handle.await;
    }
    let _ = rotation_handle.await;
    info!("slack-mcp-server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the stdio transport.
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
