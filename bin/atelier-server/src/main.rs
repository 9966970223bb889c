//! atelier-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database and run pending migrations.
//! 4. Create the scheduler queue and start the lifecycle archiver.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod archive;
mod blob;
mod catalog;
mod config;
mod db;
mod error;
mod middleware;
mod query;
mod routes;
mod schemas;
mod state;
mod time;

use std::net::SocketAddr;
use std::sync::Arc;

use atelier_queue::TaskQueue;
use tracing::{info, warn};

use crate::blob::FsBlobStore;
use crate::catalog::ModelCatalog;
use crate::config::Config;
use crate::db::sqlite::SqliteStore;
use crate::query::TaskIndex;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: ATELIER_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "atelier-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = Arc::new(SqliteStore::connect(&cfg.database_url).await?);
    info!(database_url = %cfg.database_url, "database ready");

    // ── 4. Scheduler queue + lifecycle archiver ────────────────────────────────
    let (queue, terminal_events) = TaskQueue::new(cfg.queue_capacity);
    let archiver_store = Arc::clone(&store);
    tokio::spawn(async move {
        archive::run(archiver_store, terminal_events).await;
        warn!("archiver exited");
    });
    info!(queue_capacity = cfg.queue_capacity, "scheduler queue ready");

    // ── 5. Shared application state ────────────────────────────────────────────
    let outputs = Arc::new(FsBlobStore::new(&cfg.outputs_dir));
    let inputs = Arc::new(FsBlobStore::new(&cfg.inputs_dir));
    let catalog = Arc::new(ModelCatalog::new(
        &cfg.models_dir,
        &cfg.loras_dir,
        &cfg.styles_dir,
    ));
    let index = Arc::new(TaskIndex::new(
        Arc::clone(&store),
        queue.clone(),
        Arc::clone(&outputs),
    ));
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        index,
        catalog,
        outputs,
        inputs,
    });

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("atelier-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => { s.recv().await; }
            Err(e)    => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
