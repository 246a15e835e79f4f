use crate::error::ApiError;
use crate::server::AppState;
use crate::service;
use crate::types::{
    AdvancedRequest, AdvancedResponse, ClusterRequest, ClusterResponse, CompareRequest,
    CompareResponse, ImportanceRequest, ImportanceResponse, PredictRequest, PredictResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json, Router};
use std::sync::Arc;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> Router {
    Router::new()
        .route("/gcn/predict", post(predict))
        .route("/gcn/advanced", post(advanced))
        .route("/gcn/compare", post(compare))
        .route("/gcn/cluster", post(cluster))
        .route("/gcn/importance", post(importance))
}

/// Run CPU-bound work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Join(e.to_string()))?
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn predict(
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(req) = payload?;
    let resp = blocking(move || service::predict(&req)).await?;
    Ok(Json(resp))
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn advanced(
    payload: Result<Json<AdvancedRequest>, JsonRejection>,
) -> Result<Json<AdvancedResponse>, ApiError> {
    let Json(req) = payload?;
    let resp = blocking(move || service::advanced(&req)).await?;
    Ok(Json(resp))
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn compare(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let Json(req) = payload?;
    let resp = blocking(move || service::compare(&req, &state.config)).await?;
    Ok(Json(resp))
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn cluster(
    payload: Result<Json<ClusterRequest>, JsonRejection>,
) -> Result<Json<ClusterResponse>, ApiError> {
    let Json(req) = payload?;
    let resp = blocking(move || service::cluster(&req)).await?;
    Ok(Json(resp))
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn importance(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ImportanceRequest>, JsonRejection>,
) -> Result<Json<ImportanceResponse>, ApiError> {
    let Json(req) = payload?;
    let resp = blocking(move || service::importance(&req, &state.config)).await?;
    Ok(Json(resp))
}
