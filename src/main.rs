use anyhow::{Context, Result};
use tokio::signal;
use tracing_subscriber::EnvFilter;

mod clustering;
mod constants;
mod history;
mod layout;
mod marker;
mod placement;
mod server;
mod settings;
mod utils;

use history::HistoryStore;
use server::{start_server, AppState};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "SmartMap marker service starting");

    let settings_path = Settings::config_path();
    let settings = Settings::load_from(&settings_path).context("Failed to load settings")?;
    tracing::info!(
        config = %settings_path.display(),
        port = settings.port,
        threshold = settings.cluster_threshold,
        max_markers = settings.max_markers,
        "settings loaded"
    );

    let history = HistoryStore::new(settings.max_history_entries);
    let port = settings.port;
    let persist = settings.persist_history;
    let mut state = AppState::new(settings, history).with_settings_path(settings_path);

    if persist {
        let cache_path = utils::get_history_cache_path();
        if let Some(dir) = cache_path.parent() {
            utils::ensure_directory_exists(dir)
                .with_context(|| format!("Creating data directory {}", dir.display()))?;
        }
        match state.history.load_from_disk(&cache_path) {
            Ok(true) => {}
            Ok(false) => tracing::info!("no usable history cache, starting empty"),
            Err(e) => tracing::warn!(error = %e, "failed to read history cache"),
        }
        state = state.with_cache_path(cache_path);
    } else {
        tracing::info!("history persistence disabled");
    }

    start_server(state.clone(), port, shutdown_signal()).await?;

    state.persist_history();
    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
