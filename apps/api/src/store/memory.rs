//! In-memory `Store` used by the test suite. Mirrors the guarantees the
//! Postgres schema enforces: unique transaction ids, one pending request
//! per user, pending-only review transitions.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::cv::{CvRecord, CvSummary};
use crate::models::upgrade::{RequestStatus, UpgradeRequest};
use crate::models::user::{User, FREE_SIGNUP_TOKENS, PRO_TOKEN_SENTINEL};
use crate::store::{NewCvRecord, NewUpgradeRequest, Store, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    cvs: HashMap<Uuid, CvRecord>,
    requests: HashMap<Uuid, UpgradeRequest>,
    failing: HashSet<&'static str>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(user.id.clone(), user);
    }

    /// Makes the named aggregate metric fail, for exercising the stats
    /// aggregator's fail-open paths. Names match the trait methods.
    pub fn fail_metric(&self, name: &'static str) {
        self.inner.lock().unwrap().failing.insert(name);
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.inner.lock().unwrap().users.get(id).cloned()
    }

    fn check_metric(inner: &Inner, name: &'static str) -> StoreResult<()> {
        if inner.failing.contains(name) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected failure: {name}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemStore {
    async fn upsert_user(
        &self,
        id: &str,
        email: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .entry(id.to_string())
            .or_insert_with(|| User {
                id: id.to_string(),
                email: email.to_string(),
                display_name: display_name.map(str::to_string),
                tokens: FREE_SIGNUP_TOKENS,
                is_pro: false,
                role: "user".to_string(),
                saved_cvs: 0,
                total_generations: 0,
                pro_since: None,
                last_login: None,
                created_at: now,
            });
        user.email = email.to_string();
        if let Some(name) = display_name {
            user.display_name = Some(name.to_string());
        }
        user.last_login = Some(now);
        Ok(user.clone())
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(id).cloned())
    }

    async fn record_generation(&self, user_id: &str, new_tokens: i32) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(user_id) {
            user.tokens = new_tokens;
            user.total_generations += 1;
        }
        Ok(())
    }

    async fn grant_pro(&self, user_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.get_mut(user_id) {
            Some(user) => {
                user.is_pro = true;
                user.tokens = PRO_TOKEN_SENTINEL;
                user.pro_since.get_or_insert(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn adjust_saved_cvs(&self, user_id: &str, delta: i32) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(user_id) {
            user.saved_cvs = (user.saved_cvs + delta).max(0);
        }
        Ok(())
    }

    async fn insert_cv(&self, cv: NewCvRecord, now: DateTime<Utc>) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let record = CvRecord {
            id,
            user_id: cv.user_id,
            title: cv.title,
            compressed_html: cv.compressed_html,
            original_size: cv.original_size,
            compressed_size: cv.compressed_size,
            industry: cv.industry,
            template: cv.template,
            created_at: now,
            last_accessed: None,
            download_count: 0,
            is_public: false,
            form_data: cv.form_data,
        };
        self.inner.lock().unwrap().cvs.insert(id, record);
        Ok(id)
    }

    async fn get_cv(&self, id: Uuid) -> StoreResult<Option<CvRecord>> {
        Ok(self.inner.lock().unwrap().cvs.get(&id).cloned())
    }

    async fn list_cvs(&self, user_id: &str) -> StoreResult<Vec<CvSummary>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .cvs
            .values()
            .filter(|cv| cv.user_id == user_id)
            .map(|cv| CvSummary {
                id: cv.id,
                user_id: cv.user_id.clone(),
                title: cv.title.clone(),
                industry: cv.industry.clone(),
                template: cv.template.clone(),
                original_size: cv.original_size,
                compressed_size: cv.compressed_size,
                created_at: cv.created_at,
                last_accessed: cv.last_accessed,
                download_count: cv.download_count,
            })
            .collect())
    }

    async fn delete_cv(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.lock().unwrap().cvs.remove(&id).is_some())
    }

    async fn touch_cv_access(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(cv) = inner.cvs.get_mut(&id) {
            cv.download_count += 1;
            cv.last_accessed = Some(now);
        }
        Ok(())
    }

    async fn transaction_id_exists(&self, transaction_id: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .values()
            .any(|r| r.transaction_id == transaction_id))
    }

    async fn has_pending_request(&self, user_id: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .values()
            .any(|r| r.user_id == user_id && r.is_pending()))
    }

    async fn insert_upgrade_request(
        &self,
        req: NewUpgradeRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .requests
            .values()
            .any(|r| r.transaction_id == req.transaction_id)
        {
            return Err(StoreError::Conflict(
                "This transaction ID has already been submitted".to_string(),
            ));
        }
        if inner
            .requests
            .values()
            .any(|r| r.user_id == req.user_id && r.is_pending())
        {
            return Err(StoreError::Conflict(
                "You already have a pending upgrade request".to_string(),
            ));
        }
        let id = Uuid::new_v4();
        inner.requests.insert(
            id,
            UpgradeRequest {
                id,
                user_id: req.user_id,
                user_email: req.user_email,
                user_name: req.user_name,
                transaction_id: req.transaction_id,
                payment_method: req.payment_method,
                payment_number: req.payment_number,
                amount: req.amount,
                status: RequestStatus::Pending.as_str().to_string(),
                submitted_at: now,
                reviewed_by: None,
                reviewed_at: None,
                notes: None,
            },
        );
        Ok(id)
    }

    async fn get_upgrade_request(&self, id: Uuid) -> StoreResult<Option<UpgradeRequest>> {
        Ok(self.inner.lock().unwrap().requests.get(&id).cloned())
    }

    async fn finalize_review(
        &self,
        id: Uuid,
        status: RequestStatus,
        reviewer: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.requests.get_mut(&id) {
            Some(req) if req.is_pending() => {
                req.status = status.as_str().to_string();
                req.reviewed_by = Some(reviewer.to_string());
                req.reviewed_at = Some(now);
                if let Some(notes) = notes {
                    req.notes = Some(notes.to_string());
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_upgrade_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> StoreResult<Vec<UpgradeRequest>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<UpgradeRequest> = inner
            .requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Self::check_metric(&inner, "count_users")?;
        Ok(inner.users.len() as i64)
    }

    async fn count_pro_users(&self) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Self::check_metric(&inner, "count_pro_users")?;
        Ok(inner.users.values().filter(|u| u.is_pro).count() as i64)
    }

    async fn count_active_since(&self, since: DateTime<Utc>) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Self::check_metric(&inner, "count_active_since")?;
        Ok(inner
            .users
            .values()
            .filter(|u| u.last_login.map_or(false, |t| t >= since))
            .count() as i64)
    }

    async fn count_cvs(&self) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Self::check_metric(&inner, "count_cvs")?;
        Ok(inner.cvs.len() as i64)
    }

    async fn total_generations(&self) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Self::check_metric(&inner, "total_generations")?;
        Ok(inner.users.values().map(|u| u.total_generations).sum())
    }
}

/// Builds a user snapshot for tests.
pub fn test_user(id: &str, is_pro: bool, tokens: i32) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        display_name: None,
        tokens,
        is_pro,
        role: "user".to_string(),
        saved_cvs: 0,
        total_generations: 0,
        pro_since: None,
        last_login: None,
        created_at: Utc::now(),
    }
}
