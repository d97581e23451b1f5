//! HTTP API: router, shared state and system handlers.

pub mod analysis;

use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::repository::AnalysisStore;
use crate::service::AnalysisPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub store: Arc<dyn AnalysisStore>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analysis::analyze))
        .route("/analyses", get(analysis::list_analyses))
        .route("/analyses/delete", post(analysis::delete_analyses))
        .route(
            "/analyses/:id",
            get(analysis::get_analysis).delete(analysis::delete_analysis),
        )
        .with_state(state);

    Router::new().nest("/api", api)
}
