//! PostgreSQL-backed `Store` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::cv::{CvRecord, CvSummary};
use crate::models::upgrade::{RequestStatus, UpgradeRequest};
use crate::models::user::{User, FREE_SIGNUP_TOKENS, PRO_TOKEN_SENTINEL};
use crate::store::{NewCvRecord, NewUpgradeRequest, Store, StoreError, StoreResult};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(anyhow::Error::new(e))
}

/// Maps a unique-violation on one of the upgrade-request indexes to the
/// conflict message the workflow promises its callers.
fn map_request_insert_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let msg = match db.constraint() {
                Some("upgrade_requests_one_pending_per_user") => {
                    "You already have a pending upgrade request"
                }
                _ => "This transaction ID has already been submitted",
            };
            return StoreError::Conflict(msg.to_string());
        }
    }
    db_err(e)
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(
        &self,
        id: &str,
        email: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, display_name, tokens, last_login)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                last_login = EXCLUDED.last_login
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(display_name)
        .bind(FREE_SIGNUP_TOKENS)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn record_generation(&self, user_id: &str, new_tokens: i32) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET tokens = $2, total_generations = total_generations + 1 WHERE id = $1",
        )
        .bind(user_id)
        .bind(new_tokens)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn grant_pro(&self, user_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_pro = TRUE, tokens = $2, pro_since = COALESCE(pro_since, $3)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(PRO_TOKEN_SENTINEL)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_saved_cvs(&self, user_id: &str, delta: i32) -> StoreResult<()> {
        sqlx::query("UPDATE users SET saved_cvs = GREATEST(saved_cvs + $2, 0) WHERE id = $1")
            .bind(user_id)
            .bind(delta)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn insert_cv(&self, cv: NewCvRecord, now: DateTime<Utc>) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO cvs
                (id, user_id, title, compressed_html, original_size, compressed_size,
                 industry, template, created_at, form_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&cv.user_id)
        .bind(&cv.title)
        .bind(&cv.compressed_html)
        .bind(cv.original_size)
        .bind(cv.compressed_size)
        .bind(&cv.industry)
        .bind(&cv.template)
        .bind(now)
        .bind(&cv.form_data)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(id)
    }

    async fn get_cv(&self, id: Uuid) -> StoreResult<Option<CvRecord>> {
        sqlx::query_as::<_, CvRecord>("SELECT * FROM cvs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn list_cvs(&self, user_id: &str) -> StoreResult<Vec<CvSummary>> {
        sqlx::query_as::<_, CvSummary>(
            r#"
            SELECT id, user_id, title, industry, template, original_size,
                   compressed_size, created_at, last_accessed, download_count
            FROM cvs
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn delete_cv(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM cvs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_cv_access(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            "UPDATE cvs SET download_count = download_count + 1, last_accessed = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn transaction_id_exists(&self, transaction_id: &str) -> StoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM upgrade_requests WHERE transaction_id = $1")
                .bind(transaction_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn has_pending_request(&self, user_id: &str) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM upgrade_requests WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn insert_upgrade_request(
        &self,
        req: NewUpgradeRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO upgrade_requests
                (id, user_id, user_email, user_name, transaction_id,
                 payment_method, payment_number, amount, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9)
            "#,
        )
        .bind(id)
        .bind(&req.user_id)
        .bind(&req.user_email)
        .bind(&req.user_name)
        .bind(&req.transaction_id)
        .bind(&req.payment_method)
        .bind(&req.payment_number)
        .bind(req.amount)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_request_insert_err)?;
        Ok(id)
    }

    async fn get_upgrade_request(&self, id: Uuid) -> StoreResult<Option<UpgradeRequest>> {
        sqlx::query_as::<_, UpgradeRequest>("SELECT * FROM upgrade_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn finalize_review(
        &self,
        id: Uuid,
        status: RequestStatus,
        reviewer: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE upgrade_requests
            SET status = $2, reviewed_by = $3, reviewed_at = $4, notes = COALESCE($5, notes)
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer)
        .bind(now)
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_upgrade_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> StoreResult<Vec<UpgradeRequest>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, UpgradeRequest>(
                    "SELECT * FROM upgrade_requests WHERE status = $1 ORDER BY submitted_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, UpgradeRequest>(
                    "SELECT * FROM upgrade_requests ORDER BY submitted_at DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        };
        rows.map_err(db_err)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn count_pro_users(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_pro")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn count_active_since(&self, since: DateTime<Utc>) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE last_login >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn count_cvs(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM cvs")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn total_generations(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COALESCE(SUM(total_generations), 0)::BIGINT FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}
