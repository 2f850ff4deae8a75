//! Inkdraft server binary
//!
//! Wires config, provider, task store and executor together, then serves the
//! HTTP API until ctrl-c / SIGTERM.

mod models;
mod routes;
mod state;

use anyhow::Context;
use clap::Parser;
use inkdraft_foundation::{InkdraftConfig, JsonStore};
use inkdraft_provider::{MockProvider, OpenAiProvider, TextProvider};
use inkdraft_task::{TaskExecutor, TaskStore};
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "inkdraft", about = "AI novel-writing background task server")]
struct Args {
    /// Path to inkdraft.toml (defaults to ./inkdraft.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut config = InkdraftConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let provider = build_provider(&config);
    let store = TaskStore::new();
    let archive = JsonStore::global().context("opening archive directory")?;
    let executor = TaskExecutor::new(store.clone(), provider).with_archive(archive);

    spawn_cleanup_loop(store.clone(), &config);

    let app = routes::create_router(AppState::new(store, executor))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("inkdraft={},tower_http=warn", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Pick the text provider from config. Without an API key the server still
/// starts, backed by the mock provider, so the task API can be exercised
/// end to end locally.
fn build_provider(config: &InkdraftConfig) -> Arc<dyn TextProvider> {
    match &config.provider.api_key {
        Some(key) => {
            let mut provider = OpenAiProvider::new(key.clone(), config.provider.model.clone())
                .with_timeout(Duration::from_secs(config.provider.timeout_secs));
            if let Some(base_url) = &config.provider.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            info!(model = %config.provider.model, "using OpenAI-compatible provider");
            Arc::new(provider)
        }
        None => {
            warn!("no API key configured, falling back to the mock provider");
            Arc::new(MockProvider::new())
        }
    }
}

/// Periodically sweep old terminal tasks out of the in-memory store
fn spawn_cleanup_loop(store: TaskStore, config: &InkdraftConfig) {
    let retention = Duration::from_secs(config.tasks.retention_secs);
    let interval = Duration::from_secs(config.tasks.cleanup_interval_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately, skip it
        loop {
            ticker.tick().await;
            let removed = store.cleanup_older_than(retention).await;
            if removed > 0 {
                info!(removed, "swept old terminal tasks");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
