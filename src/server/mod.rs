use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};

pub mod events;
pub mod handlers;
pub mod state;

pub use self::state::AppState;
use handlers::{
    clear_history, cluster_markers, get_clusters, get_history, get_markers, get_settings, health,
    history_events_stream, record_visit, update_settings,
};

// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/history",
            get(get_history).post(record_visit).delete(clear_history),
        )
        .route("/api/markers", get(get_markers))
        .route("/api/clusters", get(get_clusters))
        .route("/api/cluster", post(cluster_markers))
        .route("/api/settings", get(get_settings).post(update_settings))
        .route("/api/events", get(history_events_stream))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

pub async fn start_server<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("SmartMap marker service listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server failed")?;
    Ok(())
}
