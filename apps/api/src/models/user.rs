use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Credits granted on first sign-in. Each free generation consumes one.
pub const FREE_SIGNUP_TOKENS: i32 = 3;

/// Display value written to `tokens` when Pro is granted. Once `is_pro` is
/// set, the numeric token count carries no meaning for authorization —
/// `is_pro` is the sole authority for unlimited access.
pub const PRO_TOKEN_SENTINEL: i32 = 999_999;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub tokens: i32,
    pub is_pro: bool,
    pub role: String,
    pub saved_cvs: i32,
    pub total_generations: i64,
    pub pro_since: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
