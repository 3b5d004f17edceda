//! Upgrade-request workflow semantics.
//!
//! A request moves `pending → approved` or `pending → rejected`, exactly
//! once. Uniqueness guards fail closed: the pre-checks give friendly
//! conflict messages, and the store's unique constraints catch the raced
//! second writer the pre-checks cannot see.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::upgrade::{RequestStatus, UpgradeRequest};
use crate::store::{NewUpgradeRequest, Store};
use crate::upgrade::validation::{validate_submission, SubmissionFields};

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitUpgradeRequest {
    pub user_id: String,
    pub user_email: String,
    pub user_name: Option<String>,
    pub transaction_id: String,
    pub payment_method: String,
    pub payment_number: String,
    pub amount: i32,
}

/// Submits a payment-verification request. Conflicts (duplicate transaction
/// id anywhere, or an existing pending request for this user) are rejected.
pub async fn submit(
    store: &dyn Store,
    expected_amount: i32,
    req: SubmitUpgradeRequest,
) -> Result<Uuid, AppError> {
    let method = validate_submission(
        &SubmissionFields {
            user_id: &req.user_id,
            user_email: &req.user_email,
            user_name: req.user_name.as_deref(),
            transaction_id: &req.transaction_id,
            payment_method: &req.payment_method,
            payment_number: &req.payment_number,
            amount: req.amount,
        },
        expected_amount,
    )
    .map_err(AppError::Validation)?;

    let transaction_id = req.transaction_id.trim().to_string();
    if store.transaction_id_exists(&transaction_id).await? {
        return Err(AppError::Conflict(
            "This transaction ID has already been submitted".to_string(),
        ));
    }
    if store.has_pending_request(&req.user_id).await? {
        return Err(AppError::Conflict(
            "You already have a pending upgrade request".to_string(),
        ));
    }

    let id = store
        .insert_upgrade_request(
            NewUpgradeRequest {
                user_id: req.user_id.clone(),
                user_email: req.user_email,
                user_name: req.user_name,
                transaction_id,
                payment_method: method.as_str().to_string(),
                payment_number: req.payment_number.trim().to_string(),
                amount: req.amount,
            },
            Utc::now(),
        )
        .await?;

    info!("Upgrade request {id} submitted by user {}", req.user_id);
    Ok(id)
}

/// Approves a pending request: grants Pro to the requester, then marks the
/// request approved. The grant runs first so a failed grant leaves the
/// request pending for a retry; the status flip is guarded on `pending`,
/// so a concurrent second review loses cleanly.
pub async fn approve(store: &dyn Store, request_id: Uuid, reviewer: &str) -> Result<(), AppError> {
    let req = load_pending(store, request_id).await?;

    let now = Utc::now();
    if !store.grant_pro(&req.user_id, now).await? {
        // Leave the request pending: approval without the grant taking
        // effect must never be recorded.
        return Err(AppError::NotFound(format!(
            "User {} no longer exists",
            req.user_id
        )));
    }

    if !store
        .finalize_review(request_id, RequestStatus::Approved, reviewer, None, now)
        .await?
    {
        warn!("Upgrade request {request_id} was reviewed concurrently");
        return Err(AppError::Conflict(
            "This request has already been reviewed".to_string(),
        ));
    }

    info!("Upgrade request {request_id} approved by {reviewer}; user {} is now Pro", req.user_id);
    Ok(())
}

/// Rejects a pending request with a reviewer note. No entitlement change.
pub async fn reject(
    store: &dyn Store,
    request_id: Uuid,
    reviewer: &str,
    reason: Option<&str>,
) -> Result<(), AppError> {
    load_pending(store, request_id).await?;

    if !store
        .finalize_review(
            request_id,
            RequestStatus::Rejected,
            reviewer,
            reason,
            Utc::now(),
        )
        .await?
    {
        warn!("Upgrade request {request_id} was reviewed concurrently");
        return Err(AppError::Conflict(
            "This request has already been reviewed".to_string(),
        ));
    }

    info!("Upgrade request {request_id} rejected by {reviewer}");
    Ok(())
}

/// Lists requests, optionally filtered by status, newest first.
pub async fn list(
    store: &dyn Store,
    status: Option<RequestStatus>,
) -> Result<Vec<UpgradeRequest>, AppError> {
    Ok(store.list_upgrade_requests(status).await?)
}

async fn load_pending(store: &dyn Store, request_id: Uuid) -> Result<UpgradeRequest, AppError> {
    let req = store
        .get_upgrade_request(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upgrade request {request_id} not found")))?;
    if !req.is_pending() {
        return Err(AppError::Conflict(format!(
            "This request has already been {}",
            req.status
        )));
    }
    Ok(req)
}
