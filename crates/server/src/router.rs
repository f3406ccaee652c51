use axum::{
    Router,
    routing::{get, post},
};
use lobcast_runner::LocalPipeline;
use std::future::Future;
use std::sync::Arc;

use crate::handlers;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Arc<LocalPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<LocalPipeline>) -> Self {
        AppState { pipeline }
    }
}

/// Create the REST API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/models", get(handlers::models))
        .route("/api/capabilities", get(handlers::capabilities))
        .route("/api/predict", post(handlers::predict_csv))
        .route("/api/predict-json", post(handlers::predict_json))
        .with_state(state)
}

/// Serve the API on `bind` until `shutdown` resolves
pub async fn serve<F>(bind: &str, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
