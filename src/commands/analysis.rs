use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    domain::adapters::AnalysisResponse,
    error::{AppError, CommandError},
    service::AnalyzeRequest,
};

#[derive(Debug, Deserialize)]
pub struct DeleteAnalysesRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    pub deleted: bool,
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, CommandError> {
    log::info!("Analyze request: {}", request.url);
    let result = state.pipeline.run(request).await?;
    Ok(Json(result.into()))
}

pub async fn list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisResponse>>, CommandError> {
    let records = state.store.get_all().await?;
    Ok(Json(records.into_iter().map(AnalysisResponse::from).collect()))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, CommandError> {
    let record = state
        .store
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(id))?;
    Ok(Json(record.into()))
}

pub async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state.store.delete_by_id(&id).await;
    log::info!("Delete analysis {}: {}", id, deleted);

    let status = if deleted {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, Json(DeleteResponse { deleted }))
}

pub async fn delete_analyses(
    State(state): State<AppState>,
    Json(request): Json<DeleteAnalysesRequest>,
) -> Json<DeleteResponse> {
    let deleted = state.store.delete_by_ids(&request.ids).await;
    log::info!("Batch delete of {} analyses: {}", request.ids.len(), deleted);
    Json(DeleteResponse { deleted })
}
