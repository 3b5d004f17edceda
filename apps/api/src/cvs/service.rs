//! CV store semantics: owner-scoped CRUD over compressed documents.
//!
//! Ownership is verified on every read and delete — a foreign CV is a hard
//! error, never a silently-empty result. Counter and access-stat updates
//! are non-critical side effects: they fail open with a logged anomaly and
//! never fail the primary operation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::codec;
use crate::cvs::validation::validate_cv_input;
use crate::errors::AppError;
use crate::models::cv::CvSummary;
use crate::policy;
use crate::store::{NewCvRecord, Store};

#[derive(Debug, Clone, Deserialize)]
pub struct SaveCvRequest {
    pub user_id: String,
    pub html_content: String,
    pub title: Option<String>,
    pub industry: Option<String>,
    pub template: Option<String>,
    pub form_data: Option<Value>,
}

/// Full CV payload returned by `get_cv`, with the document decompressed.
#[derive(Debug, Clone, Serialize)]
pub struct CvDetail {
    pub id: Uuid,
    pub title: String,
    pub industry: String,
    pub template: String,
    pub html: String,
    pub form_data: Option<Value>,
    pub created_at: chrono::DateTime<Utc>,
    pub download_count: i32,
}

/// Payload for the link-as-token download route.
#[derive(Debug, Clone, Serialize)]
pub struct CvDownload {
    pub html: String,
    pub title: String,
    pub template: String,
    pub industry: String,
}

/// Saves a CV for a Pro user: validate, compress, persist, bump the owner's
/// `saved_cvs` mirror. Returns the new record id.
pub async fn save_cv(store: &dyn Store, req: SaveCvRequest) -> Result<Uuid, AppError> {
    let input = validate_cv_input(
        &req.html_content,
        req.title.as_deref(),
        req.industry.as_deref(),
        req.template.as_deref(),
        req.form_data,
    )
    .map_err(AppError::Validation)?;

    let user = store
        .get_user(&req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", req.user_id)))?;
    if !policy::can_save_cv(&user).is_allowed() {
        return Err(AppError::NotPro);
    }

    let compressed = codec::compress(&input.html);
    let record = NewCvRecord {
        user_id: req.user_id.clone(),
        title: input.title,
        original_size: input.html.len() as i64,
        compressed_size: compressed.len() as i64,
        compressed_html: compressed,
        industry: input.industry,
        template: input.template,
        form_data: input.form_data,
    };
    let id = store.insert_cv(record, Utc::now()).await?;

    // The counter is a mirror; a failed bump is an anomaly to report, not a
    // reason to roll back the saved document.
    if let Err(e) = store.adjust_saved_cvs(&req.user_id, 1).await {
        warn!("saved_cvs increment failed for user {}: {e}", req.user_id);
    }

    info!("Saved CV {id} for user {}", req.user_id);
    Ok(id)
}

/// Fetches a CV with ownership check, decompresses it, and touches access
/// stats non-fatally.
pub async fn get_cv(
    store: &dyn Store,
    cv_id: Uuid,
    requesting_user_id: &str,
) -> Result<CvDetail, AppError> {
    let cv = store
        .get_cv(cv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;
    if cv.user_id != requesting_user_id {
        return Err(AppError::Forbidden("You do not own this CV".to_string()));
    }

    let html = decompress_or_unavailable(cv_id, &cv.compressed_html)?;
    touch_access(store, cv_id).await;

    Ok(CvDetail {
        id: cv.id,
        title: cv.title,
        industry: cv.industry,
        template: cv.template,
        html,
        form_data: cv.form_data,
        created_at: cv.created_at,
        download_count: cv.download_count,
    })
}

/// Lists one owner's CVs as summaries, newest first. Sorting happens here
/// rather than in the store query.
pub async fn list_cvs(store: &dyn Store, user_id: &str) -> Result<Vec<CvSummary>, AppError> {
    let mut cvs = store.list_cvs(user_id).await?;
    cvs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(cvs)
}

/// Deletes a CV after an ownership check, then decrements the owner's
/// `saved_cvs`. The two effects are not atomic; a failed decrement is
/// logged as an inconsistency and the delete stands.
pub async fn delete_cv(
    store: &dyn Store,
    cv_id: Uuid,
    requesting_user_id: &str,
) -> Result<(), AppError> {
    let cv = store
        .get_cv(cv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;
    if cv.user_id != requesting_user_id {
        return Err(AppError::Forbidden("You do not own this CV".to_string()));
    }

    if !store.delete_cv(cv_id).await? {
        return Err(AppError::NotFound(format!("CV {cv_id} not found")));
    }
    if let Err(e) = store.adjust_saved_cvs(requesting_user_id, -1).await {
        warn!(
            "saved_cvs decrement failed for user {requesting_user_id} after deleting {cv_id}: {e}"
        );
    }

    info!("Deleted CV {cv_id} for user {requesting_user_id}");
    Ok(())
}

/// Download variant: the link itself is the access token, so no requesting
/// user is checked. Decompression fallback and stat touches apply as in
/// `get_cv`.
pub async fn download_cv(store: &dyn Store, cv_id: Uuid) -> Result<CvDownload, AppError> {
    let cv = store
        .get_cv(cv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;

    let html = decompress_or_unavailable(cv_id, &cv.compressed_html)?;
    touch_access(store, cv_id).await;

    Ok(CvDownload {
        html,
        title: cv.title,
        template: cv.template,
        industry: cv.industry,
    })
}

/// Decompresses stored content. Legacy raw HTML passes through inside the
/// codec; a genuinely malformed token surfaces as content-unavailable.
fn decompress_or_unavailable(cv_id: Uuid, stored: &str) -> Result<String, AppError> {
    codec::decompress(stored).map_err(|e| {
        warn!("CV {cv_id} content unavailable: {e}");
        AppError::Internal(anyhow::anyhow!("CV {cv_id} content unavailable"))
    })
}

async fn touch_access(store: &dyn Store, cv_id: Uuid) {
    if let Err(e) = store.touch_cv_access(cv_id, Utc::now()).await {
        warn!("access-stat update failed for CV {cv_id}: {e}");
    }
}
