use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored CV document. `compressed_html` holds the codec token; legacy
/// rows may hold raw HTML, which the codec passes through on decompress.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub compressed_html: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub industry: String,
    pub template: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub download_count: i32,
    pub is_public: bool,
    pub form_data: Option<Value>,
}

/// List-view projection of a CV. Excludes the document body in both its
/// compressed and decompressed forms.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvSummary {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub industry: String,
    pub template: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub download_count: i32,
}
