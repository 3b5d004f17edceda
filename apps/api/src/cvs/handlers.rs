//! Axum route handlers for the CV API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cvs::service;
use crate::cvs::service::SaveCvRequest;
use crate::errors::AppError;
use crate::models::cv::CvSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CvListResponse {
    pub success: bool,
    pub cvs: Vec<CvSummary>,
}

/// POST /api/v1/cv
pub async fn handle_save_cv(
    State(state): State<AppState>,
    Json(req): Json<SaveCvRequest>,
) -> Result<Json<Value>, AppError> {
    let cv_id = service::save_cv(state.store.as_ref(), req).await?;
    Ok(Json(json!({ "success": true, "cv_id": cv_id })))
}

/// GET /api/v1/cv?user_id=...
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<CvListResponse>, AppError> {
    let cvs = service::list_cvs(state.store.as_ref(), &params.user_id).await?;
    Ok(Json(CvListResponse { success: true, cvs }))
}

/// GET /api/v1/cv/:id?user_id=...
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<Value>, AppError> {
    let cv = service::get_cv(state.store.as_ref(), cv_id, &params.user_id).await?;
    Ok(Json(json!({ "success": true, "cv": cv })))
}

/// DELETE /api/v1/cv/:id?user_id=...
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<Value>, AppError> {
    service::delete_cv(state.store.as_ref(), cv_id, &params.user_id).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/v1/cv/:id/download
///
/// The link itself is the access token — no ownership parameter.
pub async fn handle_download_cv(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
) -> Result<Json<service::CvDownload>, AppError> {
    let download = service::download_cv(state.store.as_ref(), cv_id).await?;
    Ok(Json(download))
}
