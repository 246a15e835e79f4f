use crate::server::AppState;
use crate::types::{HealthResponse, ServiceInfo};
use axum::routing::get;
use axum::{Extension, Json, Router};
use std::sync::Arc;

pub const ENDPOINTS: [&str; 6] = [
    "/gcn/predict",
    "/gcn/advanced",
    "/gcn/compare",
    "/gcn/cluster",
    "/gcn/importance",
    "/health",
];

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn get_root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "propago",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS.to_vec(),
    })
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn get_health(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_ms: state.started_at.elapsed().as_millis(),
        cuda_available: candle_core::utils::cuda_is_available(),
    })
}
