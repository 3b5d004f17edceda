//! Axum route handlers for the upgrade-request workflow.
//!
//! Submission is rate limited per client IP. Review routes require the
//! configured admin identity; the authenticated reviewer email is stamped
//! onto the request.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{client_ip, require_admin};
use crate::errors::AppError;
use crate::models::upgrade::{RequestStatus, UpgradeRequest};
use crate::state::AppState;
use crate::upgrade::service;
use crate::upgrade::service::SubmitUpgradeRequest;

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub action: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub success: bool,
    pub requests: Vec<UpgradeRequest>,
}

/// POST /api/v1/upgrade-requests
pub async fn handle_submit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SubmitUpgradeRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = client_ip(&headers, addr);
    if !state.rate_limiter.check(ip) {
        return Err(AppError::RateLimited);
    }

    let request_id = service::submit(state.store.as_ref(), state.config.upgrade_amount, req).await?;
    Ok(Json(json!({ "success": true, "request_id": request_id })))
}

/// GET /api/v1/upgrade-requests?status=... (admin)
pub async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<StatusFilter>,
) -> Result<Json<RequestListResponse>, AppError> {
    require_admin(&state.config, &headers)?;

    let status = match params.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(
            RequestStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter '{s}'")))?,
        ),
    };
    let requests = service::list(state.store.as_ref(), status).await?;
    Ok(Json(RequestListResponse {
        success: true,
        requests,
    }))
}

/// POST /api/v1/upgrade-requests/:id (admin review)
pub async fn handle_review(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Value>, AppError> {
    let reviewer = require_admin(&state.config, &headers)?;

    match req.action.as_str() {
        "approve" => service::approve(state.store.as_ref(), request_id, &reviewer).await?,
        "reject" => {
            service::reject(
                state.store.as_ref(),
                request_id,
                &reviewer,
                req.reason.as_deref(),
            )
            .await?
        }
        other => {
            return Err(AppError::Validation(format!(
                "action must be 'approve' or 'reject', got '{other}'"
            )))
        }
    }

    Ok(Json(json!({ "success": true })))
}
