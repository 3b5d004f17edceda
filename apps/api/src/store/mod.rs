//! Persistence seam for the three collections: users, CVs, upgrade requests.
//!
//! Services talk to `dyn Store` so the core logic is testable without a
//! running database. `PgStore` is the production implementation; an
//! in-memory implementation backs the test suite.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::{CvRecord, CvSummary};
use crate::models::upgrade::{RequestStatus, UpgradeRequest};
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness guarantee rejected the write (duplicate transaction id,
    /// second pending request).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields for a CV insert. Compression happens before this point; the store
/// persists the token as-is.
#[derive(Debug, Clone)]
pub struct NewCvRecord {
    pub user_id: String,
    pub title: String,
    pub compressed_html: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub industry: String,
    pub template: String,
    pub form_data: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NewUpgradeRequest {
    pub user_id: String,
    pub user_email: String,
    pub user_name: Option<String>,
    pub transaction_id: String,
    pub payment_method: String,
    pub payment_number: String,
    pub amount: i32,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ── users ───────────────────────────────────────────────────────────

    /// Idempotent sign-in upsert. Creates the user with default free tokens
    /// on first sight; afterwards only refreshes email, display name and
    /// `last_login` — counters and entitlements are untouched.
    async fn upsert_user(
        &self,
        id: &str,
        email: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<User>;

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Writes the post-charge token balance and bumps `total_generations`.
    async fn record_generation(&self, user_id: &str, new_tokens: i32) -> StoreResult<()>;

    /// Grants Pro: sets `is_pro`, writes the token sentinel, stamps
    /// `pro_since` if not already set. Returns false if the user is missing.
    /// Re-granting an already-Pro user is a no-op beyond the token write.
    async fn grant_pro(&self, user_id: &str, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Adjusts the `saved_cvs` mirror counter, clamped at zero.
    async fn adjust_saved_cvs(&self, user_id: &str, delta: i32) -> StoreResult<()>;

    // ── cvs ─────────────────────────────────────────────────────────────

    async fn insert_cv(&self, cv: NewCvRecord, now: DateTime<Utc>) -> StoreResult<Uuid>;

    async fn get_cv(&self, id: Uuid) -> StoreResult<Option<CvRecord>>;

    /// Summaries for one owner, unordered — callers sort by `created_at`
    /// so the storage layer never needs a composite index.
    async fn list_cvs(&self, user_id: &str) -> StoreResult<Vec<CvSummary>>;

    /// Removes a CV. Returns false when no such row existed.
    async fn delete_cv(&self, id: Uuid) -> StoreResult<bool>;

    /// Access-stat touch: bumps `download_count`, refreshes `last_accessed`.
    async fn touch_cv_access(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<()>;

    // ── upgrade requests ────────────────────────────────────────────────

    async fn transaction_id_exists(&self, transaction_id: &str) -> StoreResult<bool>;

    async fn has_pending_request(&self, user_id: &str) -> StoreResult<bool>;

    /// Inserts a new pending request. Uniqueness of the transaction id and
    /// the one-pending-per-user rule are enforced here and surface as
    /// `StoreError::Conflict`.
    async fn insert_upgrade_request(
        &self,
        req: NewUpgradeRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Uuid>;

    async fn get_upgrade_request(&self, id: Uuid) -> StoreResult<Option<UpgradeRequest>>;

    /// Flips a request out of `pending` into a terminal status, stamping the
    /// reviewer. Guarded on the current status being `pending`, so a raced
    /// second review returns false instead of overwriting a terminal state.
    async fn finalize_review(
        &self,
        id: Uuid,
        status: RequestStatus,
        reviewer: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn list_upgrade_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> StoreResult<Vec<UpgradeRequest>>;

    // ── aggregate counts ────────────────────────────────────────────────

    async fn count_users(&self) -> StoreResult<i64>;
    async fn count_pro_users(&self) -> StoreResult<i64>;
    async fn count_active_since(&self, since: DateTime<Utc>) -> StoreResult<i64>;
    async fn count_cvs(&self) -> StoreResult<i64>;
    async fn total_generations(&self) -> StoreResult<i64>;
}
