use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use pokedex_core::SanitizedConfig;
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub index_loaded: bool,
    pub index_size: usize,
    pub cached_details: usize,
}

/// Always 200. An empty index is reported, not treated as unhealthy.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.catalog().status().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        index_loaded: status.index_loaded,
        index_size: status.index_size,
        cached_details: status.cached_details,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
