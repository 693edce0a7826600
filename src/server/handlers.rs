use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{sse::Event as SseEvent, Json, Sse},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use crate::clustering::cluster;
use crate::constants::{MAX_CLUSTERED_MARKERS, SSE_HEARTBEAT_SECS, SSE_KEEPALIVE_SECS};
use crate::history::HistoryEntry;
use crate::layout::{cluster_views, ClusterView};
use crate::marker::Marker;
use crate::settings::Settings;

use super::events::HistoryEvent;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewVisit {
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkerQuery {
    pub limit: Option<usize>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterRequest {
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

fn internal_error(context: &str) -> impl Fn(anyhow::Error) -> StatusCode + '_ {
    move |e| {
        tracing::error!(error = %e, "{context}");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn current_settings(state: &AppState) -> Result<Settings, StatusCode> {
    state.settings().map_err(internal_error("settings unavailable"))
}

fn recent_markers(state: &AppState, settings: &Settings, limit: Option<usize>) -> Result<Vec<Marker>, StatusCode> {
    state
        .history
        .recent_markers(settings.marker_limit(limit))
        .map_err(internal_error("history read failed"))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// API endpoint to list visit history, newest first
pub async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, StatusCode> {
    let entries = state
        .history
        .entries()
        .map_err(internal_error("history read failed"))?;
    Ok(Json(entries))
}

// API endpoint to record a visited location
pub async fn record_visit(
    State(state): State<AppState>,
    Json(visit): Json<NewVisit>,
) -> Result<(StatusCode, Json<HistoryEntry>), StatusCode> {
    let entry = state
        .history
        .record(&visit.location, &visit.description, visit.thumbnail)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected visit");
            StatusCode::BAD_REQUEST
        })?;
    let total = state.history.len().map_err(internal_error("history read failed"))?;

    tracing::info!(id = %entry.id, location = %entry.location, total, "visit recorded");
    state.persist_history();
    state.publish(HistoryEvent::recorded(entry.clone(), total));

    Ok((StatusCode::CREATED, Json(entry)))
}

// API endpoint to forget all visits
pub async fn clear_history(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    let removed = state
        .history
        .clear()
        .map_err(internal_error("history clear failed"))?;

    tracing::info!(removed, "history cleared");
    state.persist_history();
    state.publish(HistoryEvent::cleared(removed));

    Ok(Json(serde_json::json!({
        "status": "success",
        "removed": removed,
    })))
}

// API endpoint for the most recent history markers
pub async fn get_markers(
    State(state): State<AppState>,
    Query(query): Query<MarkerQuery>,
) -> Result<Json<Vec<Marker>>, StatusCode> {
    let settings = current_settings(&state)?;
    Ok(Json(recent_markers(&state, &settings, query.limit)?))
}

// API endpoint for render-ready clusters of the most recent history markers
pub async fn get_clusters(
    State(state): State<AppState>,
    Query(query): Query<MarkerQuery>,
) -> Result<Json<Vec<ClusterView>>, StatusCode> {
    let settings = current_settings(&state)?;
    let markers = recent_markers(&state, &settings, query.limit)?;
    let threshold = query.threshold.unwrap_or(settings.cluster_threshold);

    let views = cluster_views(&markers, threshold);
    let grouped = views.iter().filter(|v| v.member_count() > 1).count();
    tracing::debug!(markers = markers.len(), clusters = views.len(), grouped, threshold, "clusters computed");
    Ok(Json(views))
}

// API endpoint to cluster caller-supplied markers (at most MAX_CLUSTERED_MARKERS)
pub async fn cluster_markers(
    State(state): State<AppState>,
    Json(request): Json<ClusterRequest>,
) -> Result<Json<Vec<Vec<Marker>>>, StatusCode> {
    if request.markers.len() > MAX_CLUSTERED_MARKERS {
        tracing::debug!(markers = request.markers.len(), "cluster request over marker limit");
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let threshold = match request.threshold {
        Some(threshold) => threshold,
        None => current_settings(&state)?.cluster_threshold,
    };

    let groups = cluster(&request.markers, threshold)
        .into_iter()
        .map(|group| group.into_iter().cloned().collect())
        .collect();
    Ok(Json(groups))
}

// API endpoint to get current settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, StatusCode> {
    Ok(Json(current_settings(&state)?))
}

// API endpoint to update settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(new_settings): Json<Settings>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = new_settings.validate() {
        tracing::debug!(error = %e, "rejected settings");
        return Err(StatusCode::BAD_REQUEST);
    }
    let new_settings = new_settings.sanitize();

    let restart_required = {
        let mut settings = state.settings.lock().map_err(|_| {
            tracing::error!("settings lock poisoned");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        let restart_required = settings.restart_required(&new_settings);
        *settings = new_settings.clone();
        restart_required
    };

    let dropped = state
        .history
        .set_capacity(new_settings.max_history_entries)
        .map_err(internal_error("failed to resize history"))?;
    if dropped > 0 {
        tracing::info!(dropped, capacity = new_settings.max_history_entries, "history trimmed to new capacity");
        state.persist_history();
    }

    if let Some(path) = &state.settings_path {
        new_settings
            .save_to(path)
            .map_err(internal_error("failed to save settings"))?;
    }
    tracing::info!(threshold = new_settings.cluster_threshold, "settings updated");

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Settings updated successfully",
        "restart_required": restart_required,
    })))
}

// SSE endpoint for history changes
pub async fn history_events_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(100);
    let mut event_receiver = state.event_sender.subscribe();

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                event = event_receiver.recv() => match event {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "SSE subscriber lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = tokio::time::sleep(Duration::from_secs(SSE_HEARTBEAT_SECS)) => HistoryEvent::heartbeat(),
            };

            let sse_event = SseEvent::default()
                .event(event.event_type.clone())
                .json_data(&event)
                .unwrap_or_else(|_| SseEvent::default().data("Error serializing event"));

            if tx.send(Ok(sse_event)).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keepalive-message"),
    )
}
