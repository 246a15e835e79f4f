use axum::Router;

pub mod gcn;
pub mod meta;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> Router {
    Router::new().merge(meta::router()).merge(gcn::router())
}
