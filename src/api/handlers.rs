//! API request handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::embeddings::GraphEmbedder;
use crate::engine::{self, AnalysisReport, EngineConfig};

use super::error::{ApiError, ApiResult};
use super::types::{parse_graph_payload, AnalyzeRequest, HealthResponse};

/// Application state shared across handlers
pub struct AppState {
    pub embedder: Arc<dyn GraphEmbedder>,
    pub config: EngineConfig,
}

/// Thread-safe shared state
pub type SharedState = Arc<AppState>;

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "graphlens".to_string(),
        embedding_provider: state.embedder.provider_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Full graph analysis endpoint
pub async fn analyze(
    State(state): State<SharedState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalysisReport>> {
    let start = Instant::now();

    let input = parse_graph_payload(request).map_err(|message| {
        warn!(%message, "rejecting analyze request");
        ApiError::BadRequest(message)
    })?;

    let report = engine::run_full_analysis(input, state.embedder.as_ref(), &state.config).await;

    info!(
        nodes = report.graph_metrics.num_nodes,
        edges = report.graph_metrics.num_edges,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );

    Ok(Json(report))
}
