use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blendfarm_api::config::ServerConfig;
use blendfarm_api::router::build_app_router;
use blendfarm_api::state::AppState;
use blendfarm_scheduler::accounts::discover_accounts;
use blendfarm_scheduler::SlurmClient;
use blendfarm_store::ProjectStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blendfarm_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let mut config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Project root ---
    ProjectStore::new(&config.project_root)
        .ensure_layout()
        .await
        .expect("Failed to create project root");
    // Scheduler jobs run elsewhere, so every path handed to them is absolute.
    config.project_root = tokio::fs::canonicalize(&config.project_root)
        .await
        .expect("Failed to resolve project root");
    let store = ProjectStore::new(&config.project_root);
    tracing::info!(root = %config.project_root.display(), "Project root ready");

    match store.reconcile_orphans().await {
        Ok(removed) if !removed.is_empty() => {
            tracing::warn!(count = removed.len(), ?removed, "Removed orphaned projects at startup");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Startup orphan reconciliation failed"),
    }

    // --- Scheduler ---
    let client = Arc::new(SlurmClient::new(
        config.scheduler.submit_bin.clone(),
        config.scheduler.status_bin.clone(),
        config.scheduler_timeout(),
    ));
    tracing::info!(
        submit_bin = %config.scheduler.submit_bin,
        status_bin = %config.scheduler.status_bin,
        cluster = %config.scheduler.cluster,
        "Scheduler client configured"
    );

    let accounts = match discover_accounts(config.scheduler_timeout()).await {
        Ok(accounts) => accounts,
        Err(e) => {
            tracing::warn!(error = %e, "Account discovery failed, no accounts offered");
            Vec::new()
        }
    };
    tracing::info!(count = accounts.len(), "Scheduler accounts discovered");

    // --- App state + router ---
    let state = AppState::new(config.clone(), store, client, accounts);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
